//! Entry points shared by the command line tools.
//!
//! `*_main` functions own the process concerns (arguments, logging, exit
//! codes). `execute_*` functions take everything they touch as parameters so
//! that tests can drive them with an in-memory client.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use thiserror::Error;
use tracing::{debug, error};
use ytpl_core::{
    AppConfig, Direction, DivisionResult, JsonFileReportWriter, PlaylistClient, Prompter,
    ReconciliationReport, Workflow, WorkflowOutcome, YouTubeClient,
};

use crate::args::{BulkArgs, CommonArgs, DivideArgs, normalize_legacy_flags};
use crate::console::ConsolePrompter;
use crate::logging::{self, LoggingConfig};

/// Errors that end a command line run.
#[derive(Debug, Error)]
pub enum CliError {
    /// Bad arguments, or a help/version request.
    #[error(transparent)]
    Usage(#[from] clap::Error),

    /// The workflow could not run or complete.
    #[error(transparent)]
    Core(#[from] ytpl_core::Error),

    /// Writing the summary failed.
    #[error("Failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code for this error.
    ///
    /// Help and version output exit 0; everything else exits 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(e) if !e.use_stderr() => 0,
            _ => 1,
        }
    }
}

/// Load configuration from `--config`, or from the default location.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be read or parsed.
pub fn load_config(common: &CommonArgs) -> Result<AppConfig, CliError> {
    let config = common
        .config
        .as_deref()
        .map_or_else(AppConfig::load, AppConfig::load_from)?;
    Ok(config)
}

fn report_directory(common: &CommonArgs, config: &AppConfig) -> PathBuf {
    common
        .report_dir
        .clone()
        .unwrap_or_else(|| config.report_directory.clone())
}

/// Run a bulk add or remove and print a summary to `out`.
///
/// # Errors
///
/// Returns an error if the destination playlist cannot be read, a report
/// cannot be written, or the summary cannot be printed.
pub fn execute_bulk(
    direction: Direction,
    args: &BulkArgs,
    config: &AppConfig,
    client: &dyn PlaylistClient,
    prompter: &mut dyn Prompter,
    out: &mut dyn Write,
) -> Result<WorkflowOutcome<ReconciliationReport>, CliError> {
    let mut writer = JsonFileReportWriter::new(report_directory(&args.common, config));
    debug!("Reports go to {}", writer.directory().display());

    let outcome = Workflow::new(client, prompter, &mut writer)
        .with_region(config.region_code.clone())
        .run_bulk(&args.request(direction), &args.workflow_options())?;

    match &outcome {
        WorkflowOutcome::Committed {
            result,
            report_path,
        } => {
            writeln!(out, "Bulk {direction} complete: {}", result.summary())?;
            writeln!(out, "Result: {}", report_path.display())?;
        }
        stopped => print_stopped(stopped, out)?,
    }
    Ok(outcome)
}

/// Divide videos into per-category playlists and print a summary to `out`.
///
/// # Errors
///
/// Returns an error if a report cannot be written or the summary cannot be
/// printed.
pub fn execute_divide(
    args: &DivideArgs,
    config: &AppConfig,
    client: &dyn PlaylistClient,
    prompter: &mut dyn Prompter,
    out: &mut dyn Write,
) -> Result<WorkflowOutcome<DivisionResult>, CliError> {
    let mut writer = JsonFileReportWriter::new(report_directory(&args.common, config));
    debug!("Reports go to {}", writer.directory().display());

    let outcome = Workflow::new(client, prompter, &mut writer)
        .with_region(config.region_code.clone())
        .run_divide(&args.request(), &args.workflow_options())?;

    match &outcome {
        WorkflowOutcome::Committed {
            result,
            report_path,
        } => {
            for created in &result.created {
                writeln!(
                    out,
                    "{} -> {} ({})",
                    created.category,
                    created.playlist_url,
                    created.report.summary()
                )?;
            }
            for failed in &result.failed {
                writeln!(
                    out,
                    "{} -> not created: {} ({} videos left out)",
                    failed.category,
                    failed.reason,
                    failed.videos.len()
                )?;
            }
            writeln!(out, "Result: {}", report_path.display())?;
        }
        stopped => print_stopped(stopped, out)?,
    }
    Ok(outcome)
}

fn print_stopped<T>(outcome: &WorkflowOutcome<T>, out: &mut dyn Write) -> io::Result<()> {
    let status = match outcome {
        WorkflowOutcome::PreviewOnly { .. } => "Preview only",
        WorkflowOutcome::NothingToDo { .. } => "Nothing to do",
        WorkflowOutcome::Cancelled { .. } => "Cancelled",
        WorkflowOutcome::Committed { .. } => return Ok(()),
    };
    match outcome.preview_path() {
        Some(path) => writeln!(out, "{status}. Preview: {}", path.display()),
        None => writeln!(out, "{status}."),
    }
}

fn connect(config: &AppConfig) -> Result<YouTubeClient, CliError> {
    let token = config.access_token()?;
    Ok(YouTubeClient::from_config(config, &token)?)
}

fn usage_exit(err: clap::Error) -> ExitCode {
    // clap prints help and version to stdout, usage errors to stderr
    let _ = err.print();
    ExitCode::from(CliError::Usage(err).exit_code())
}

fn finish<T>(result: Result<T, CliError>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

/// Process entry point of `bulk-add-to-playlist` and `bulk-remove-from-playlist`.
pub fn bulk_main(direction: Direction) -> ExitCode {
    let args = match BulkArgs::try_parse_from(normalize_legacy_flags(std::env::args_os())) {
        Ok(args) => args,
        Err(e) => return usage_exit(e),
    };
    let _guard = logging::init_with_fallback(&LoggingConfig::for_verbosity(args.common.verbose));

    finish(load_config(&args.common).and_then(|config| {
        let client = connect(&config)?;
        let mut prompter = ConsolePrompter::stdio();
        execute_bulk(
            direction,
            &args,
            &config,
            &client,
            &mut prompter,
            &mut io::stdout(),
        )
    }))
}

/// Process entry point of `divide-into-categories`.
pub fn divide_main() -> ExitCode {
    let args = match DivideArgs::try_parse_from(normalize_legacy_flags(std::env::args_os())) {
        Ok(args) => args,
        Err(e) => return usage_exit(e),
    };
    let _guard = logging::init_with_fallback(&LoggingConfig::for_verbosity(args.common.verbose));

    finish(load_config(&args.common).and_then(|config| {
        let client = connect(&config)?;
        let mut prompter = ConsolePrompter::stdio();
        execute_divide(&args, &config, &client, &mut prompter, &mut io::stdout())
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::ffi::OsStr;

    use super::*;

    #[test]
    fn test_usage_error_exits_one() {
        let err = BulkArgs::try_parse_from(["bulk-add-to-playlist", "only-urls"]).unwrap_err();
        assert_eq!(CliError::Usage(err).exit_code(), 1);
    }

    #[test]
    fn test_help_exits_zero() {
        let err = BulkArgs::try_parse_from(["bulk-add-to-playlist", "--help"]).unwrap_err();
        assert_eq!(CliError::Usage(err).exit_code(), 0);

        let err = DivideArgs::try_parse_from(["divide-into-categories", "--version"]).unwrap_err();
        assert_eq!(CliError::Usage(err).exit_code(), 0);
    }

    #[test]
    fn test_core_error_exits_one() {
        let err = CliError::from(ytpl_core::Error::Configuration("bad".to_string()));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_report_dir_flag_overrides_config() {
        let args = DivideArgs::try_parse_from(["d", "u", "--report-dir", "here"]).unwrap();
        let config = AppConfig {
            report_directory: PathBuf::from("there"),
            ..AppConfig::default()
        };
        assert_eq!(report_directory(&args.common, &config), PathBuf::from("here"));

        let args = DivideArgs::try_parse_from(["d", "u"]).unwrap();
        assert_eq!(report_directory(&args.common, &config), PathBuf::from("there"));
    }

    #[test]
    fn test_missing_config_file_gives_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("absent.json");
        let args = DivideArgs::try_parse_from([
            OsStr::new("d"),
            OsStr::new("u"),
            OsStr::new("--config"),
            path.as_os_str(),
        ])
        .unwrap();
        assert_eq!(load_config(&args.common).unwrap(), AppConfig::default());
    }
}

//! Command line arguments.
//!
//! Flags are parsed once here and turned into [`WorkflowOptions`]; nothing
//! further down reads the process arguments.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use ytpl_core::{BulkRequest, DivideRequest, Direction, WorkflowOptions, split_references};

/// Single-dash long flags accepted for compatibility, and their replacements.
const LEGACY_FLAGS: [(&str, &str); 3] = [
    ("-force", "--force"),
    ("-previewonly", "--previewonly"),
    ("-name", "--name"),
];

/// Add videos to, or remove them from, a playlist
///
/// Sources may be single videos or whole playlists. A preview report is
/// written and confirmation is asked before anything changes, unless
/// --force is given.
#[derive(Debug, Clone, Parser)]
#[command(version)]
pub struct BulkArgs {
    /// Comma separated video or playlist URLs
    #[arg(value_name = "COMMA_SEPARATED_URLS")]
    pub urls: String,

    /// URL of the playlist to change
    #[arg(value_name = "PLAYLIST_URL")]
    pub playlist_url: String,

    /// Skip the preview and the confirmation
    #[arg(short, long)]
    pub force: bool,

    /// Write the preview and stop
    #[arg(short = 'p', long = "previewonly")]
    pub preview_only: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Divide videos into new playlists, one per category
///
/// Every category found among the sources gets a new playlist holding the
/// videos of that category.
#[derive(Debug, Clone, Parser)]
#[command(version)]
pub struct DivideArgs {
    /// Comma separated video or playlist URLs
    #[arg(value_name = "COMMA_SEPARATED_URLS")]
    pub urls: String,

    /// Skip the preview and the confirmation
    #[arg(short, long)]
    pub force: bool,

    /// Write the preview and stop
    #[arg(short = 'p', long = "previewonly")]
    pub preview_only: bool,

    /// Use automatic playlist names instead of asking
    #[arg(short = 'n', long = "name")]
    pub auto_name: bool,

    /// Name playlists <BASE_NAME>_<category> instead of <category>_<timestamp>
    #[arg(long, value_name = "BASE_NAME")]
    pub base_name: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Options shared by every tool.
#[derive(Debug, Clone, clap::Args)]
pub struct CommonArgs {
    /// Show debug output
    #[arg(short, long)]
    pub verbose: bool,

    /// Read configuration from this file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write reports to this directory
    #[arg(long, value_name = "DIR")]
    pub report_dir: Option<PathBuf>,
}

impl BulkArgs {
    /// Workflow flags.
    pub fn workflow_options(&self) -> WorkflowOptions {
        WorkflowOptions {
            force: self.force,
            preview_only: self.preview_only,
            ..WorkflowOptions::default()
        }
    }

    /// Workflow request for a direction.
    pub fn request(&self, direction: Direction) -> BulkRequest {
        BulkRequest {
            direction,
            source_urls: split_references(&self.urls),
            playlist_url: self.playlist_url.trim().to_string(),
        }
    }
}

impl DivideArgs {
    /// Workflow flags.
    pub fn workflow_options(&self) -> WorkflowOptions {
        WorkflowOptions {
            force: self.force,
            preview_only: self.preview_only,
            auto_name: self.auto_name,
            base_name: self.base_name.clone(),
        }
    }

    /// Workflow request.
    pub fn request(&self) -> DivideRequest {
        DivideRequest {
            source_urls: split_references(&self.urls),
        }
    }
}

/// Rewrite legacy single-dash long flags to their double-dash form.
///
/// Without this `-name` would be read as the cluster `-n -a -m -e`.
pub fn normalize_legacy_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            LEGACY_FLAGS
                .iter()
                .find(|(legacy, _)| arg.to_str() == Some(*legacy))
                .map_or(arg.clone(), |(_, modern)| OsString::from(modern))
        })
        .collect()
}

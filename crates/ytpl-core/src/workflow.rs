//! Workflow orchestration.
//!
//! Sequences one invocation of a bulk add/remove or a category division:
//! resolve inputs, preview, ask for confirmation, commit, report. This is the
//! only place that decides when a run stops; everything below it returns data.
//!
//! # Bulk add/remove
//!
//! ```text
//! ResolveInputs -> ResolveDestination -> [Preview -> Confirm] -> Commit -> Report
//! ```
//!
//! The preview/confirm pair runs unless `force` is set without `preview_only`.
//! The destination snapshot taken up front is reused by the commit; it is not
//! re-read after the confirmation pause.
//!
//! # Divide into categories
//!
//! ```text
//! ResolveInputs -> Categorize -> [Preview -> Confirm] -> Create + Add per category -> Report
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::builder::{ResolvedVideos, VideoSetBuilder};
use crate::categorize::{auto_playlist_name, categorize};
use crate::client::PlaylistClient;
use crate::error::{Error, Result};
use crate::model::{CategoryLookup, VideoSet};
use crate::reconcile::{Direction, ReconciliationReport, Reconciler};
use crate::report::{self, ReportKind, ReportSink, timestamp_now};
use crate::url;

/// Question asked at the confirmation gate.
pub const CONFIRMATION_QUESTION: &str = "Do you want to proceed? (yes/no): ";

/// Input label of the video set in division reports.
pub const DIVIDE_INPUT_LABEL: &str = "videos_to_divide";

// =============================================================================
// Options and collaborators
// =============================================================================

/// Flags controlling one workflow run, built once by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowOptions {
    /// Skip the confirmation gate (and the preview, unless `preview_only`).
    pub force: bool,
    /// Stop after writing the preview.
    pub preview_only: bool,
    /// Use automatic playlist names instead of prompting.
    pub auto_name: bool,
    /// Base for automatic playlist names.
    pub base_name: Option<String>,
}

impl WorkflowOptions {
    /// Whether a preview pass runs.
    pub const fn runs_preview(&self) -> bool {
        !self.force || self.preview_only
    }
}

/// Interactive decisions the workflow needs from the user.
pub trait Prompter {
    /// Ask a yes/no question; `true` means proceed.
    fn confirm(&mut self, question: &str) -> bool;

    /// Ask for a playlist name. An empty answer selects `suggested`.
    fn playlist_name(&mut self, category: &str, suggested: &str) -> String;
}

/// Whether a confirmation answer means yes (`yes` or `y`, any case).
pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("yes") || answer.eq_ignore_ascii_case("y")
}

/// Phase of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowPhase {
    /// Building the source video set.
    ResolvingInputs,
    /// Reading the destination playlist.
    ResolvingDestination,
    /// Grouping videos by category.
    Categorizing,
    /// Running the preview pass.
    Previewing,
    /// Waiting at the confirmation gate.
    AwaitingConfirmation,
    /// Running the commit pass.
    Committing,
    /// Writing the result report.
    Reporting,
}

impl fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResolvingInputs => write!(f, "Resolving inputs"),
            Self::ResolvingDestination => write!(f, "Resolving destination"),
            Self::Categorizing => write!(f, "Categorizing"),
            Self::Previewing => write!(f, "Previewing"),
            Self::AwaitingConfirmation => write!(f, "Awaiting confirmation"),
            Self::Committing => write!(f, "Committing"),
            Self::Reporting => write!(f, "Reporting"),
        }
    }
}

// =============================================================================
// Requests and results
// =============================================================================

/// A bulk add or remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkRequest {
    /// Add or remove.
    pub direction: Direction,
    /// Video and playlist references to move.
    pub source_urls: Vec<String>,
    /// Destination playlist reference.
    pub playlist_url: String,
}

/// A division of videos into per-category playlists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DivideRequest {
    /// Video and playlist references to divide.
    pub source_urls: Vec<String>,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome<T> {
    /// The commit pass ran.
    Committed {
        /// What the commit did.
        result: T,
        /// Where the result report went.
        report_path: PathBuf,
    },
    /// Stopped after the preview as requested.
    PreviewOnly {
        /// Where the preview went.
        preview_path: PathBuf,
    },
    /// The preview found nothing to do.
    NothingToDo {
        /// Where the preview went.
        preview_path: PathBuf,
    },
    /// The user declined at the confirmation gate.
    Cancelled {
        /// Where the preview went.
        preview_path: PathBuf,
    },
}

impl<T> WorkflowOutcome<T> {
    /// Committed result, if the commit ran.
    pub const fn result(&self) -> Option<&T> {
        match self {
            Self::Committed { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Preview report path, if a preview stopped the run.
    pub const fn preview_path(&self) -> Option<&PathBuf> {
        match self {
            Self::PreviewOnly { preview_path }
            | Self::NothingToDo { preview_path }
            | Self::Cancelled { preview_path } => Some(preview_path),
            Self::Committed { .. } => None,
        }
    }
}

/// Preview of one category's playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryPreview {
    /// Automatic name the playlist would get.
    pub playlist_name: String,
    /// Forecast of the add pass.
    pub report: ReconciliationReport,
}

/// Preview of a division.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DivisionPreview {
    /// Per-category forecasts.
    pub categories: BTreeMap<String, CategoryPreview>,
    /// True when no category would receive a video.
    pub no_actions: bool,
}

/// A category whose playlist was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedCategoryPlaylist {
    /// Category label.
    pub category: String,
    /// Name given to the playlist.
    pub playlist_name: String,
    /// New playlist id.
    pub playlist_id: String,
    /// New playlist URL.
    pub playlist_url: String,
    /// Outcome of adding the category's videos.
    pub report: ReconciliationReport,
}

/// A category whose playlist could not be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedCategory {
    /// Category label.
    pub category: String,
    /// Name the playlist would have had.
    pub playlist_name: String,
    /// Why creation failed.
    pub reason: String,
    /// Videos left uncommitted.
    pub videos: VideoSet,
}

/// What a division commit did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DivisionResult {
    /// Categories that got a playlist.
    pub created: Vec<CreatedCategoryPlaylist>,
    /// Categories that did not.
    pub failed: Vec<FailedCategory>,
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Runs workflows against a client, a prompter and a report sink.
pub struct Workflow<'a> {
    client: &'a dyn PlaylistClient,
    prompter: &'a mut dyn Prompter,
    sink: &'a mut dyn ReportSink,
    region_code: String,
    timestamp: String,
}

impl<'a> Workflow<'a> {
    /// Create a workflow with the default region and the current time.
    pub fn new(
        client: &'a dyn PlaylistClient,
        prompter: &'a mut dyn Prompter,
        sink: &'a mut dyn ReportSink,
    ) -> Self {
        Self {
            client,
            prompter,
            sink,
            region_code: "US".to_string(),
            timestamp: timestamp_now(),
        }
    }

    /// Region used to look up category labels.
    #[must_use]
    pub fn with_region(mut self, region_code: impl Into<String>) -> Self {
        self.region_code = region_code.into();
        self
    }

    /// Timestamp used in automatic playlist names.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// Run a bulk add or remove.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDestination`] when the destination playlist
    /// cannot be read; nothing is previewed or committed in that case. Report
    /// write failures are also returned.
    pub fn run_bulk(
        &mut self,
        request: &BulkRequest,
        options: &WorkflowOptions,
    ) -> Result<WorkflowOutcome<ReconciliationReport>> {
        let direction = request.direction;
        info!(
            "Bulk {}: {} reference(s) -> {}",
            direction,
            request.source_urls.len(),
            request.playlist_url
        );

        info!("Phase 1: {}...", WorkflowPhase::ResolvingInputs);
        let categories = self.categories();
        let builder = VideoSetBuilder::new(self.client);
        let resolved = builder.build(&request.source_urls, &categories);

        info!("Phase 2: {}...", WorkflowPhase::ResolvingDestination);
        let (playlist_id, destination) =
            self.resolve_destination(&request.playlist_url, &categories)?;
        info!(
            "Destination {} holds {} video(s)",
            playlist_id,
            destination.len()
        );

        let input = input_data(
            direction.input_label(),
            Some(&request.playlist_url),
            &resolved,
        )?;
        let reconciler = Reconciler::new(self.client);

        if options.runs_preview() {
            info!("Phase 3: {}...", WorkflowPhase::Previewing);
            let preview = reconciler.reconcile(
                direction,
                Some(&playlist_id),
                &resolved.videos,
                &destination,
                true,
            );
            if let Some(stop) = self.preview_gate(&input, &preview, preview.no_actions, options)? {
                return Ok(stop);
            }
        }

        info!("Phase 4: {}...", WorkflowPhase::Committing);
        let result = reconciler.reconcile(
            direction,
            Some(&playlist_id),
            &resolved.videos,
            &destination,
            false,
        );

        info!("Phase 5: {}...", WorkflowPhase::Reporting);
        let report_path = self.write(ReportKind::Result, &input, &result)?;
        info!("Operation completed. Result saved to: {}", report_path.display());
        Ok(WorkflowOutcome::Committed {
            result,
            report_path,
        })
    }

    /// Divide videos into one new playlist per category.
    ///
    /// # Errors
    ///
    /// Returns an error only when a report cannot be written. A playlist that
    /// cannot be created is recorded under `failed` and the run continues.
    pub fn run_divide(
        &mut self,
        request: &DivideRequest,
        options: &WorkflowOptions,
    ) -> Result<WorkflowOutcome<DivisionResult>> {
        info!(
            "Divide into categories: {} reference(s)",
            request.source_urls.len()
        );

        info!("Phase 1: {}...", WorkflowPhase::ResolvingInputs);
        let categories = self.categories();
        let builder = VideoSetBuilder::new(self.client);
        let resolved = builder.build(&request.source_urls, &categories);

        info!("Phase 2: {}...", WorkflowPhase::Categorizing);
        let groups = categorize(&resolved.videos);
        let base_name = options.base_name.as_deref();
        let auto_names: BTreeMap<String, String> = groups
            .keys()
            .map(|c| (c.clone(), auto_playlist_name(base_name, c, &self.timestamp)))
            .collect();
        info!("{} categor(ies) found", groups.len());

        let input = input_data(DIVIDE_INPUT_LABEL, None, &resolved)?;
        let reconciler = Reconciler::new(self.client);
        let nothing = VideoSet::new();

        if options.runs_preview() {
            info!("Phase 3: {}...", WorkflowPhase::Previewing);
            let mut preview = DivisionPreview {
                categories: BTreeMap::new(),
                no_actions: true,
            };
            for (category, videos) in &groups {
                let report = reconciler.reconcile(Direction::Add, None, videos, &nothing, true);
                preview.no_actions &= report.no_actions;
                let playlist_name = auto_names
                    .get(category.as_str())
                    .cloned()
                    .unwrap_or_default();
                preview.categories.insert(
                    category.clone(),
                    CategoryPreview {
                        playlist_name,
                        report,
                    },
                );
            }
            if let Some(stop) = self.preview_gate(&input, &preview, preview.no_actions, options)? {
                return Ok(stop);
            }
        }

        info!("Phase 4: {}...", WorkflowPhase::Committing);
        let mut result = DivisionResult::default();
        for (category, videos) in groups {
            let suggested = auto_names
                .get(category.as_str())
                .cloned()
                .unwrap_or_default();
            let playlist_name = if options.auto_name {
                suggested
            } else {
                let answer = self.prompter.playlist_name(&category, &suggested);
                let answer = answer.trim();
                if answer.is_empty() {
                    suggested
                } else {
                    answer.to_string()
                }
            };

            match self.client.create_playlist(&playlist_name) {
                Ok(created) => {
                    info!(
                        "Created playlist '{}' for category '{}': {}",
                        playlist_name, category, created.playlist_url
                    );
                    let report = reconciler.reconcile(
                        Direction::Add,
                        Some(&created.playlist_id),
                        &videos,
                        &nothing,
                        false,
                    );
                    result.created.push(CreatedCategoryPlaylist {
                        category,
                        playlist_name,
                        playlist_id: created.playlist_id,
                        playlist_url: created.playlist_url,
                        report,
                    });
                }
                Err(e) => {
                    warn!(
                        "Could not create playlist '{}' for category '{}': {}",
                        playlist_name, category, e
                    );
                    result.failed.push(FailedCategory {
                        category,
                        playlist_name,
                        reason: e.to_string(),
                        videos,
                    });
                }
            }
        }

        info!("Phase 5: {}...", WorkflowPhase::Reporting);
        let report_path = self.write(ReportKind::Result, &input, &result)?;
        info!(
            "Operation completed. Result saved to: {} ({} created, {} failed)",
            report_path.display(),
            result.created.len(),
            result.failed.len()
        );
        Ok(WorkflowOutcome::Committed {
            result,
            report_path,
        })
    }

    /// Category labels, or an empty lookup if they cannot be fetched.
    fn categories(&self) -> CategoryLookup {
        match self.client.list_categories(&self.region_code) {
            Ok(lookup) => lookup,
            Err(e) => {
                warn!(
                    "Could not fetch categories for region {}: {}; all videos will be '{}'",
                    self.region_code,
                    e,
                    crate::model::UNKNOWN_CATEGORY
                );
                CategoryLookup::default()
            }
        }
    }

    /// Read the destination playlist in full.
    fn resolve_destination(
        &self,
        playlist_url: &str,
        categories: &CategoryLookup,
    ) -> Result<(String, VideoSet)> {
        let invalid = |reason: String| Error::InvalidDestination {
            url: playlist_url.to_string(),
            reason,
        };

        let playlist_id = url::extract_playlist_id(playlist_url).map_err(|e| invalid(e.to_string()))?;
        let snapshot = VideoSetBuilder::new(self.client)
            .snapshot_playlist(&playlist_id, categories)
            .map_err(|e| invalid(e.to_string()))?;

        if !snapshot.unavailable.is_empty() {
            warn!(
                "Destination has {} unavailable member(s)",
                snapshot.unavailable.len()
            );
        }
        Ok((playlist_id, snapshot.videos))
    }

    /// Write the preview and apply the confirmation gate.
    ///
    /// Returns the terminal outcome when the run must stop here.
    fn preview_gate<T, D: Serialize>(
        &mut self,
        input: &Value,
        preview: &D,
        no_actions: bool,
        options: &WorkflowOptions,
    ) -> Result<Option<WorkflowOutcome<T>>> {
        let preview_path = self.write(ReportKind::Preview, input, preview)?;
        info!("Preview generated. Please review: {}", preview_path.display());

        if options.preview_only {
            info!("Exiting due to -previewonly flag.");
            return Ok(Some(WorkflowOutcome::PreviewOnly { preview_path }));
        }
        if no_actions {
            info!("Exiting with no operations to execute.");
            return Ok(Some(WorkflowOutcome::NothingToDo { preview_path }));
        }
        if options.force {
            return Ok(None);
        }

        info!("{}...", WorkflowPhase::AwaitingConfirmation);
        if self.prompter.confirm(CONFIRMATION_QUESTION) {
            Ok(None)
        } else {
            info!("Operation cancelled.");
            Ok(Some(WorkflowOutcome::Cancelled { preview_path }))
        }
    }

    fn write<D: Serialize>(&mut self, kind: ReportKind, input: &Value, data: &D) -> Result<PathBuf> {
        let document = report::document(kind, input, data)?;
        self.sink.write(kind, &document)
    }
}

/// The `input_data` section shared by preview and result reports.
fn input_data(label: &str, playlist_url: Option<&str>, resolved: &ResolvedVideos) -> Result<Value> {
    let mut input = serde_json::Map::new();
    if let Some(url) = playlist_url {
        input.insert("playlist_url".to_string(), Value::String(url.to_string()));
    }
    input.insert(label.to_string(), serde_json::to_value(&resolved.videos)?);
    input.insert(
        "unavailable_videos".to_string(),
        serde_json::to_value(&resolved.unavailable)?,
    );
    input.insert(
        "unavailable_playlist_ids".to_string(),
        serde_json::to_value(&resolved.unavailable_playlists)?,
    );
    Ok(Value::Object(input))
}

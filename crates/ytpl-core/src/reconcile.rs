//! Diff and reconciliation of a desired video set against a playlist.
//!
//! The same pass serves as preview and commit. In preview no mutating call is
//! issued and the classification is a forecast; in commit each mutation is
//! attempted once and a failure only affects its own item.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::client::PlaylistClient;
use crate::model::{VideoRecord, VideoSet};

/// Which way videos move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Insert desired videos missing from the playlist.
    Add,
    /// Delete desired videos present in the playlist.
    Remove,
}

impl Direction {
    /// Label of the desired set in report input data.
    pub const fn input_label(self) -> &'static str {
        match self {
            Self::Add => "videos_to_add",
            Self::Remove => "videos_to_remove",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Remove => write!(f, "remove"),
        }
    }
}

/// Outcome of reconciling one video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// Inserted (or would be, in preview).
    Added,
    /// Already a member; nothing to do.
    AlreadyPresent,
    /// Deleted (or would be, in preview).
    Removed,
    /// Not a member; nothing to do.
    NotPresent,
    /// The mutation was attempted and failed.
    Failed(String),
}

impl ActionOutcome {
    /// Kind of this outcome, without the failure reason.
    pub const fn kind(&self) -> OutcomeKind {
        match self {
            Self::Added => OutcomeKind::Added,
            Self::AlreadyPresent => OutcomeKind::AlreadyPresent,
            Self::Removed => OutcomeKind::Removed,
            Self::NotPresent => OutcomeKind::NotPresent,
            Self::Failed(_) => OutcomeKind::Failed,
        }
    }
}

/// Outcome kind, used as the key of report totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// See [`ActionOutcome::Added`].
    Added,
    /// See [`ActionOutcome::AlreadyPresent`].
    AlreadyPresent,
    /// See [`ActionOutcome::Removed`].
    Removed,
    /// See [`ActionOutcome::NotPresent`].
    NotPresent,
    /// See [`ActionOutcome::Failed`].
    Failed,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::AlreadyPresent => write!(f, "already present"),
            Self::Removed => write!(f, "removed"),
            Self::NotPresent => write!(f, "not present"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// One video and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeEntry {
    /// The video.
    pub video: VideoRecord,
    /// Its outcome.
    pub outcome: ActionOutcome,
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Direction of the pass.
    pub direction: Direction,
    /// Whether mutations were withheld.
    pub is_preview: bool,
    /// Per-video outcomes, in desired-set order.
    pub outcomes: Vec<OutcomeEntry>,
    /// Count of each outcome kind present in `outcomes`.
    pub totals: BTreeMap<OutcomeKind, usize>,
    /// True when nothing would be added or removed.
    pub no_actions: bool,
}

impl ReconciliationReport {
    /// Empty report for a direction.
    pub const fn new(direction: Direction, is_preview: bool) -> Self {
        Self {
            direction,
            is_preview,
            outcomes: Vec::new(),
            totals: BTreeMap::new(),
            no_actions: true,
        }
    }

    /// Append an outcome and update totals.
    pub fn record(&mut self, video: VideoRecord, outcome: ActionOutcome) {
        let kind = outcome.kind();
        *self.totals.entry(kind).or_insert(0) += 1;
        if matches!(kind, OutcomeKind::Added | OutcomeKind::Removed) {
            self.no_actions = false;
        }
        self.outcomes.push(OutcomeEntry { video, outcome });
    }

    /// Number of outcomes of a kind.
    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.totals.get(&kind).copied().unwrap_or(0)
    }

    /// Number of processed videos.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether no videos were processed.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Outcome recorded for a video id.
    pub fn outcome_of(&self, video_id: &str) -> Option<&ActionOutcome> {
        self.outcomes
            .iter()
            .find(|e| e.video.video_id == video_id)
            .map(|e| &e.outcome)
    }

    /// One-line summary for the console.
    pub fn summary(&self) -> String {
        let parts: Vec<String> = self
            .totals
            .iter()
            .map(|(kind, count)| format!("{count} {kind}"))
            .collect();
        if parts.is_empty() {
            "no videos".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Classifies desired videos against a destination and applies mutations.
pub struct Reconciler<'a, C: PlaylistClient + ?Sized> {
    client: &'a C,
}

impl<'a, C: PlaylistClient + ?Sized> Reconciler<'a, C> {
    /// Create a reconciler over `client`.
    pub const fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Reconcile `desired` against the `destination` snapshot.
    ///
    /// `target` is the playlist that inserts go to. With no target (a playlist
    /// that does not exist yet) nothing can be inserted, so only preview makes
    /// sense; a commit without a target fails every would-be insert.
    pub fn reconcile(
        &self,
        direction: Direction,
        target: Option<&str>,
        desired: &VideoSet,
        destination: &VideoSet,
        is_preview: bool,
    ) -> ReconciliationReport {
        let mut report = ReconciliationReport::new(direction, is_preview);

        for video in desired {
            let member = destination.get(&video.video_id);
            let outcome = match (direction, member) {
                (Direction::Add, Some(_)) => ActionOutcome::AlreadyPresent,
                (Direction::Add, None) if is_preview => ActionOutcome::Added,
                (Direction::Add, None) => self.insert(target, &video.video_id),
                (Direction::Remove, None) => ActionOutcome::NotPresent,
                (Direction::Remove, Some(_)) if is_preview => ActionOutcome::Removed,
                (Direction::Remove, Some(existing)) => {
                    self.delete(existing.source_item_id.as_deref())
                }
            };
            log_outcome(video, &outcome, is_preview);
            report.record(video.clone(), outcome);
        }

        info!(
            "{} {} pass: {}",
            if is_preview { "Preview" } else { "Commit" },
            direction,
            report.summary()
        );
        report
    }

    fn insert(&self, target: Option<&str>, video_id: &str) -> ActionOutcome {
        let Some(playlist_id) = target else {
            return ActionOutcome::Failed("no target playlist".to_string());
        };
        match self.client.insert_member(playlist_id, video_id) {
            Ok(_) => ActionOutcome::Added,
            Err(e) => ActionOutcome::Failed(e.to_string()),
        }
    }

    fn delete(&self, membership_id: Option<&str>) -> ActionOutcome {
        let Some(membership_id) = membership_id else {
            return ActionOutcome::Failed("membership id unknown".to_string());
        };
        match self.client.delete_member(membership_id) {
            Ok(()) => ActionOutcome::Removed,
            Err(e) => ActionOutcome::Failed(e.to_string()),
        }
    }
}

fn log_outcome(video: &VideoRecord, outcome: &ActionOutcome, is_preview: bool) {
    let prefix = if is_preview { "[preview] " } else { "" };
    match outcome {
        ActionOutcome::Failed(reason) => warn!(
            "{}{} ({}): failed: {}",
            prefix, video.title, video.video_id, reason
        ),
        other => info!(
            "{}{} ({}): {}",
            prefix,
            video.title,
            video.video_id,
            other.kind()
        ),
    }
}

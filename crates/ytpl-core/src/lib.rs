//! `ytpl` Core Library
//!
//! This crate provides the core functionality for bulk-managing YouTube
//! playlists:
//! - Reference resolution for video and playlist URLs
//! - Video set construction with paginated playlist walks
//! - Reconciliation of a desired video set against a live playlist
//! - Categorization of videos into per-category playlists
//! - Preview / confirm / commit workflow orchestration with JSON reports
//! - Application configuration management
//!
//! The `test-support` feature adds an in-memory playlist service and report
//! sink for driving workflows without the network.
//!
//! # Error Handling
//!
//! Failures that concern a single reference or a single video are turned into
//! data (unavailable entries and `Failed` outcomes). Only failures that stop a
//! whole run surface as [`Error`]. See the [`error`] module for details.
//!
//! ```rust
//! use ytpl_core::memory::MemoryClient;
//! use ytpl_core::report::MemoryReportSink;
//! use ytpl_core::workflow::{BulkRequest, Prompter, Workflow, WorkflowOptions};
//! use ytpl_core::Direction;
//!
//! struct Yes;
//! impl Prompter for Yes {
//!     fn confirm(&mut self, _question: &str) -> bool { true }
//!     fn playlist_name(&mut self, _category: &str, suggested: &str) -> String {
//!         suggested.to_string()
//!     }
//! }
//!
//! let client = MemoryClient::new()
//!     .with_video("abc123", "Song", "10")
//!     .with_playlist("PLdest", "Destination", &[]);
//! let mut sink = MemoryReportSink::new();
//! let request = BulkRequest {
//!     direction: Direction::Add,
//!     source_urls: vec!["https://www.youtube.com/watch?v=abc123".to_string()],
//!     playlist_url: "https://www.youtube.com/playlist?list=PLdest".to_string(),
//! };
//!
//! let outcome = Workflow::new(&client, &mut Yes, &mut sink)
//!     .run_bulk(&request, &WorkflowOptions::default())
//!     .unwrap();
//! assert!(outcome.result().is_some());
//! ```

pub mod builder;
pub mod categorize;
pub mod client;
pub mod config;
pub mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod model;
pub mod reconcile;
pub mod report;
pub mod url;
pub mod workflow;
pub mod youtube;

pub use builder::{METADATA_BATCH_SIZE, PlaylistSnapshot, ResolvedVideos, VideoSetBuilder};
pub use categorize::{CategoryGroups, auto_playlist_name, categorize};
pub use client::{
    CreatedPlaylist, MAX_BATCH_SIZE, MemberPage, PlaylistClient, PlaylistMember, PlaylistMetadata,
    VideoMetadata,
};
pub use config::{AppConfig, PlaylistPrivacy, config_file_path};
pub use error::{Error, ErrorKind, ResourceKind, Result};
#[cfg(any(test, feature = "test-support"))]
pub use memory::{MemoryClient, Mutation};
pub use model::{CategoryLookup, UNKNOWN_CATEGORY, UnavailableEntry, VideoRecord, VideoSet};
pub use reconcile::{
    ActionOutcome, Direction, OutcomeEntry, OutcomeKind, ReconciliationReport, Reconciler,
};
#[cfg(any(test, feature = "test-support"))]
pub use report::MemoryReportSink;
pub use report::{
    JsonFileReportWriter, ReportKind, ReportSink, TIMESTAMP_FORMAT, prune_empty, timestamp_now,
};
pub use url::{ReferenceKind, VideoRef, extract_playlist_id, resolve, split_references};
pub use workflow::{
    BulkRequest, CreatedCategoryPlaylist, DivideRequest, DivisionPreview, DivisionResult,
    FailedCategory, Prompter, Workflow, WorkflowOptions, WorkflowOutcome, WorkflowPhase,
    is_affirmative,
};
pub use youtube::YouTubeClient;

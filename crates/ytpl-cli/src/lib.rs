//! Command line front end for `ytpl`.
//!
//! Three binaries share this library:
//! - `bulk-add-to-playlist`: add videos and whole playlists to a playlist
//! - `bulk-remove-from-playlist`: remove them again
//! - `divide-into-categories`: create one playlist per video category
//!
//! Each tool resolves its inputs, writes a preview report, asks for
//! confirmation and only then changes anything. See [`run`] for the shared
//! entry points.

pub mod args;
pub mod console;
pub mod logging;
pub mod run;

pub use args::{BulkArgs, CommonArgs, DivideArgs, normalize_legacy_flags};
pub use console::ConsolePrompter;
pub use run::{CliError, bulk_main, divide_main, execute_bulk, execute_divide, load_config};

//! Add videos, or every video of some playlists, to a playlist.

use std::process::ExitCode;

use ytpl_core::Direction;

fn main() -> ExitCode {
    ytpl_cli::bulk_main(Direction::Add)
}

//! Remove videos, or every video of some playlists, from a playlist.

use std::process::ExitCode;

use ytpl_core::Direction;

fn main() -> ExitCode {
    ytpl_cli::bulk_main(Direction::Remove)
}

//! Split videos into new playlists, one per video category.

fn main() -> std::process::ExitCode {
    ytpl_cli::divide_main()
}

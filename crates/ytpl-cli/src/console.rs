//! Interactive prompts on a terminal.

use std::io::{self, BufRead, Write};

use tracing::warn;
use ytpl_core::{Prompter, is_affirmative};

/// Asks questions on `writer` and reads answers from `reader`.
///
/// End of input counts as "no" for confirmations and as an empty answer for
/// playlist names.
pub struct ConsolePrompter<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> ConsolePrompter<R, W> {
    /// Create a prompter over any reader and writer.
    pub const fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Consume the prompter, returning the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn ask(&mut self, question: &str) -> Option<String> {
        if let Err(e) = write!(self.writer, "{question}").and_then(|()| self.writer.flush()) {
            warn!("Failed to write prompt: {}", e);
        }

        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()),
            Err(e) => {
                warn!("Failed to read answer: {}", e);
                None
            }
        }
    }
}

impl ConsolePrompter<io::StdinLock<'static>, io::Stdout> {
    /// Prompter on the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter for ConsolePrompter<R, W> {
    fn confirm(&mut self, question: &str) -> bool {
        self.ask(question).is_some_and(|answer| is_affirmative(&answer))
    }

    fn playlist_name(&mut self, category: &str, suggested: &str) -> String {
        self.ask(&format!(
            "Enter playlist name for category '{category}' (or press Enter to use auto-generated name '{suggested}'): "
        ))
        .unwrap_or_default()
    }
}

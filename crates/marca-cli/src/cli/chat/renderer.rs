//! Incremental rendering of streamed replies.
//!
//! The stream feed publishes the whole accumulated text on every update.
//! `StreamPrinter` remembers how much of it is already on screen and hands
//! back only the new suffix, so the terminal output is append-only.

use std::io::Write;

use console::style;

use marca_types::stream::StreamSnapshot;

/// Tracks what has been printed for the current stream generation.
#[derive(Debug, Default)]
pub struct StreamPrinter {
    generation: Option<u64>,
    printed: usize,
}

impl StreamPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any text of the current reply has been printed.
    pub fn has_output(&self) -> bool {
        self.printed > 0
    }

    /// The not-yet-printed suffix of `snapshot`, if any.
    ///
    /// A new generation restarts the count. A snapshot whose text is shorter
    /// than what was printed (cleared on settle) yields nothing.
    pub fn update(&mut self, snapshot: &StreamSnapshot) -> Option<String> {
        if self.generation != Some(snapshot.generation) {
            self.generation = Some(snapshot.generation);
            self.printed = 0;
        }
        self.suffix(&snapshot.text)
    }

    /// The remainder of the final reply text beyond what was streamed.
    pub fn finish(&mut self, full_text: &str) -> Option<String> {
        let rest = self.suffix(full_text);
        self.printed = 0;
        self.generation = None;
        rest
    }

    fn suffix(&mut self, text: &str) -> Option<String> {
        if text.len() <= self.printed {
            return None;
        }
        let rest = text.get(self.printed..)?;
        self.printed = text.len();
        Some(rest.to_string())
    }
}

/// Print a streamed fragment without a trailing newline.
pub fn print_fragment(text: &str) {
    print!("{text}");
    let _ = std::io::stdout().flush();
}

/// Print the speaker label that opens an assistant reply.
pub fn print_assistant_label() {
    print!("\n  {} ", style("Marca").cyan().bold());
    let _ = std::io::stdout().flush();
}

/// Print a complete assistant message (scripted questionnaire text).
pub fn print_assistant_message(text: &str) {
    print_assistant_label();
    println!("{}", indent_continuation(text));
    println!();
}

/// Indent every line after the first so multi-line replies stay aligned
/// with the label.
pub fn indent_continuation(text: &str) -> String {
    text.replace('\n', "\n  ")
}

//! Output rendering for streamed completions.
//!
//! The streaming completion never writes to the terminal directly; it hands
//! each fragment to a [`Renderer`]. The binary uses [`PlainTextRenderer`],
//! tests use [`BufferRenderer`].

use std::io::{self, Stdout, Write};

/// ANSI escape code for dim text (used for the response marker).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// Trait for rendering streamed output.
pub trait Renderer: Send {
    /// Called once before the first fragment of a response.
    fn start_response(&mut self) {}

    /// Print a chunk of response text.
    ///
    /// This is called incrementally, in arrival order, as fragments are
    /// streamed from the API.
    fn print_text(&mut self, text: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called when a response is complete.
    ///
    /// Used to ensure proper newlines after streaming.
    fn finish_response(&mut self);
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
        }
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn start_response(&mut self) {
        if self.use_color {
            println!("{ANSI_DIM}>{ANSI_RESET}");
        } else {
            println!(">");
        }
        self.flush();
    }

    fn print_text(&mut self, text: &str) {
        print!("{text}");
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        if self.use_color {
            eprintln!("{ANSI_RED}Error: {error}{ANSI_RESET}");
        } else {
            eprintln!("Error: {error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        println!("{info}");
    }

    fn finish_response(&mut self) {
        println!();
        self.flush();
    }
}

/// Renderer that keeps everything in memory.
#[derive(Debug, Default, Clone)]
pub struct BufferRenderer {
    /// Response text, in the order it was printed.
    pub text: String,
    /// Every fragment passed to `print_text`.
    pub fragments: Vec<String>,
    /// Informational lines.
    pub info: Vec<String>,
    /// Error lines.
    pub errors: Vec<String>,
    /// Number of responses started.
    pub started: usize,
    /// Number of responses finished.
    pub finished: usize,
}

impl BufferRenderer {
    /// Creates an empty renderer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for BufferRenderer {
    fn start_response(&mut self) {
        self.started += 1;
    }

    fn print_text(&mut self, text: &str) {
        self.text.push_str(text);
        self.fragments.push(text.to_string());
    }

    fn print_error(&mut self, error: &str) {
        self.errors.push(error.to_string());
    }

    fn print_info(&mut self, info: &str) {
        self.info.push(info.to_string());
    }

    fn finish_response(&mut self) {
        self.finished += 1;
    }
}

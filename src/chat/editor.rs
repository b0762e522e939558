//! Message composition in an external editor.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::{Error, Result};

/// Editor used when `$EDITOR` is not set.
const DEFAULT_EDITOR: &[&str] = &["code", "--wait"];

/// A source for the text of the next user message.
pub trait ContentSource {
    /// Produce the message text, blocking until it is available.
    fn acquire_content(&mut self) -> Result<String>;
}

/// Opens an editor on a fresh draft file and returns what was saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalEditor {
    dir: PathBuf,
    program: String,
    args: Vec<String>,
}

impl ExternalEditor {
    /// Creates an editor running `program args... <draft>` with drafts in `dir`.
    pub fn new(dir: impl Into<PathBuf>, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            dir: dir.into(),
            program: program.into(),
            args,
        }
    }

    /// Uses `$EDITOR` when set, `code --wait` otherwise.
    pub fn from_env(dir: impl Into<PathBuf>) -> Self {
        let command = std::env::var("EDITOR")
            .ok()
            .filter(|editor| !editor.trim().is_empty());
        let mut words: Vec<String> = match command {
            Some(editor) => editor.split_whitespace().map(String::from).collect(),
            None => DEFAULT_EDITOR.iter().map(|s| s.to_string()).collect(),
        };
        let program = words.remove(0);
        Self::new(dir, program, words)
    }

    /// The program that will be run.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Creates an empty draft named after the current time.
    fn create_draft(&self) -> Result<PathBuf> {
        let now = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|err| Error::validation(format!("failed to format timestamp: {err}"), None))?;
        let path = self.dir.join(format!("{now}.md"));
        File::create(&path).map_err(|err| {
            Error::io(
                format!("failed to create draft {}: {err}", path.display()),
                err,
            )
        })?;
        Ok(path)
    }

    fn run(&self, draft: &Path) -> Result<()> {
        tracing::debug!(program = %self.program, draft = %draft.display(), "opening editor");
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(draft)
            .status()
            .map_err(|err| Error::io(format!("failed to run {}: {err}", self.program), err))?;
        if !status.success() {
            return Err(Error::io(
                format!("{} exited with {status}", self.program),
                io::Error::other(status.to_string()),
            ));
        }
        Ok(())
    }
}

impl ContentSource for ExternalEditor {
    fn acquire_content(&mut self) -> Result<String> {
        let draft = self.create_draft()?;
        self.run(&draft)?;
        let content = fs::read_to_string(&draft).map_err(|err| {
            Error::io(format!("failed to read draft {}: {err}", draft.display()), err)
        })?;
        if content.trim().is_empty() {
            return Err(Error::validation(
                format!("draft {} is empty", draft.display()),
                Some("edit".to_string()),
            ));
        }
        Ok(content)
    }
}

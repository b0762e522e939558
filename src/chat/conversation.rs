//! Conversation records.
//!
//! One conversation is one file, `{dir}/{id}.json`, holding the ordered
//! message log. The log only ever grows.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chat::store::{create_record, overwrite_record, read_record};
use crate::error::Result;
use crate::types::Message;

/// An append-only, ordered log of messages identified by an opaque id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    id: String,
    messages: Vec<Message>,
}

impl Conversation {
    /// Creates an empty conversation.
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_messages(id, Vec::new())
    }

    /// Creates a conversation from an existing log.
    pub fn with_messages(id: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            id: id.into(),
            messages,
        }
    }

    /// The conversation identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages in the log.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Appends a message to the end of the log.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Path of the file backing conversation `id` under `dir`.
    pub fn path(dir: impl AsRef<Path>, id: &str) -> PathBuf {
        dir.as_ref().join(format!("{id}.json"))
    }

    /// Whether a file for conversation `id` exists under `dir`.
    pub fn exists(dir: impl AsRef<Path>, id: &str) -> bool {
        Self::path(dir, id).is_file()
    }

    /// Reads conversation `id` from `dir`.
    ///
    /// # Errors
    ///
    /// `NotFound` naming the missing path, or `Corrupt` on malformed content.
    pub fn read(dir: impl AsRef<Path>, id: &str) -> Result<Self> {
        let file: ConversationFile = read_record(&Self::path(dir, id), "conversation")?;
        Ok(Self::with_messages(id, file.messages))
    }

    /// Writes this conversation to a new file under `dir`.
    pub fn create(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        create_record(&Self::path(dir, &self.id), &self.to_file(dir), "conversation")
    }

    /// Rewrites the existing file for this conversation under `dir`.
    pub fn update(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        overwrite_record(&Self::path(dir, &self.id), &self.to_file(dir), "conversation")
    }

    /// The record as it is stored on disk.
    pub fn to_file(&self, dir: &Path) -> ConversationFile {
        ConversationFile {
            messages: self.messages.clone(),
            dir: dir.display().to_string(),
        }
    }
}

/// On-disk representation of a conversation.
///
/// `dir` mirrors the directory the file was written to. It is kept so files
/// stay readable by older tooling and is ignored when reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationFile {
    /// The message log, oldest first.
    pub messages: Vec<Message>,

    /// Directory the file was written to.
    #[serde(default)]
    pub dir: String,
}

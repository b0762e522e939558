//! Configuration for cgpt.
//!
//! Two kinds of configuration live here: the command line (parsed with
//! `arrrg`) that shapes a single invocation, and the persisted [`Config`]
//! record that remembers the active conversation and model between runs.

use std::path::{Path, PathBuf};

use arrrg_derive::CommandLine;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::chat::store::{create_record, overwrite_record, read_record};
use crate::error::{Error, Result};
use crate::types::Model;

/// Directory under the home directory used when `--dir` is not given.
const DEFAULT_HOME_DIR: &str = ".cgpt";

/// Name of the config file inside the installation directory.
const CONFIG_FILE: &str = "config.json";

/// Directory holding one JSON file per conversation.
const CONVERSATIONS_DIR: &str = "chat";

/// Directory holding editor drafts.
const DRAFTS_DIR: &str = "message";

/// Command-line arguments for the cgpt tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct CgptArgs {
    /// Compose the message in an external editor.
    #[arrrg(flag, "Compose the message in an external editor (-e)")]
    pub edit: bool,

    /// Installation directory.
    #[arrrg(optional, "Directory for config and conversations (default: ~/.cgpt)", "DIR")]
    pub dir: Option<String>,

    /// Base URL of the chat completions API.
    #[arrrg(optional, "API base URL (default: https://api.openai.com/v1/)", "URL")]
    pub base_url: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgptConfig {
    /// Where config, conversations and drafts live.
    pub layout: Layout,

    /// Whether the message comes from the external editor.
    pub edit: bool,

    /// Override for the API base URL.
    pub base_url: Option<String>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl CgptConfig {
    /// Resolves command-line arguments, filling in defaults.
    ///
    /// # Errors
    ///
    /// Fails when no `--dir` is given and the home directory is unknown.
    pub fn from_args(args: CgptArgs) -> Result<Self> {
        let layout = match args.dir {
            Some(dir) => Layout::new(dir),
            None => Layout::default_location()?,
        };
        Ok(Self {
            layout,
            edit: args.edit,
            base_url: args.base_url,
            use_color: !args.no_color,
        })
    }
}

/// On-disk layout of an installation.
///
/// ```text
/// home/
/// ├── config.json
/// ├── chat/
/// │   └── {conversation-id}.json
/// └── message/
///     └── {timestamp}.md
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    home: PathBuf,
}

impl Layout {
    /// Creates a layout rooted at `home`.
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// The layout rooted at `~/.cgpt`.
    pub fn default_location() -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            Error::validation("could not determine the home directory", Some("dir".to_string()))
        })?;
        Ok(Self::new(home.join(DEFAULT_HOME_DIR)))
    }

    /// The installation directory.
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Path of the singleton config file.
    pub fn config_path(&self) -> PathBuf {
        self.home.join(CONFIG_FILE)
    }

    /// Directory holding the conversation files.
    pub fn conversations_dir(&self) -> PathBuf {
        self.home.join(CONVERSATIONS_DIR)
    }

    /// Directory the external editor writes drafts into.
    pub fn drafts_dir(&self) -> PathBuf {
        self.home.join(DRAFTS_DIR)
    }

    /// Creates every directory of the layout that does not exist yet.
    pub fn ensure(&self) -> Result<()> {
        for dir in [self.conversations_dir(), self.drafts_dir()] {
            std::fs::create_dir_all(&dir).map_err(|err| {
                Error::io(
                    format!("failed to create directory {}: {err}", dir.display()),
                    err,
                )
            })?;
        }
        Ok(())
    }
}

/// The persisted singleton record: which conversation is active and which
/// model answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Identifier of the conversation new messages are appended to.
    #[serde(rename = "sessionId", alias = "chatId")]
    pub active_conversation_id: String,

    /// The model used for completions.
    #[serde(default)]
    pub model: Model,
}

impl Config {
    /// Creates a config pointing at `active_conversation_id`.
    pub fn new(active_conversation_id: impl Into<String>, model: Model) -> Self {
        Self {
            active_conversation_id: active_conversation_id.into(),
            model,
        }
    }

    /// A first-run config: a fresh conversation id and the default model.
    pub fn fresh() -> Result<Self> {
        Ok(Self::new(new_conversation_id()?, Model::default()))
    }

    /// Loads the config stored at `path`.
    ///
    /// # Errors
    ///
    /// `NotFound` when there is no file, `Corrupt` when it does not parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        read_record(path.as_ref(), "config")
    }

    /// Writes this config to a new file at `path`, replacing any existing one.
    pub fn create(&self, path: impl AsRef<Path>) -> Result<()> {
        create_record(path.as_ref(), self, "config")
    }

    /// Rewrites the existing config file at `path`.
    ///
    /// # Errors
    ///
    /// `Io` when the file cannot be opened, e.g. because it was deleted.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        overwrite_record(path.as_ref(), self, "config")
    }
}

/// Generates a random (version 4) conversation identifier.
///
/// # Errors
///
/// `RandomSource` when the operating system cannot supply randomness.
pub fn new_conversation_id() -> Result<String> {
    let mut bytes = [0u8; 16];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|err| Error::random_source(format!("failed to generate identifier: {err}")))?;
    Ok(uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .to_string())
}

//! The chat application: persisted conversations driven from the command line.
//!
//! This module provides everything one `cgpt` invocation needs:
//!
//! - [`config`]: command-line arguments, installation layout and the persisted config
//! - [`conversation`]: the per-conversation message log files
//! - [`session`]: the orchestrator tying config, conversation and completion together
//! - [`commands`]: mapping command-line words to a command
//! - [`editor`] and [`picker`]: interactive collaborators

pub mod commands;
pub mod config;
pub mod conversation;
pub mod editor;
pub mod picker;
pub mod session;
mod store;

pub use commands::{ChatCommand, parse_command, usage};
pub use config::{CgptArgs, CgptConfig, Config, Layout, new_conversation_id};
pub use conversation::{Conversation, ConversationFile};
pub use editor::{ContentSource, ExternalEditor};
pub use picker::{ModelSelector, PromptSelector, parse_selection};
pub use session::{ChatSession, Interaction};

// Public modules
pub mod chat;
pub mod client;
pub mod completion;
pub mod error;
pub mod observability;
pub mod render;
pub mod sse;
pub mod types;

// Re-exports
pub use client::OpenAi;
pub use completion::{Completion, MOCK_REPLY, MockCompletion, StreamingCompletion};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use render::{BufferRenderer, PlainTextRenderer, Renderer};
pub use types::*;

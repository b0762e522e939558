// Public modules
pub mod chat_completion_chunk;
pub mod chat_completion_request;
pub mod message;
pub mod model;

// Re-exports
pub use chat_completion_chunk::{ChatCompletionChunk, ChunkChoice, ChunkDelta};
pub use chat_completion_request::ChatCompletionRequest;
pub use message::{Message, MessageRole};
pub use model::{KnownModel, Model};

use serde::{Deserialize, Serialize};

use crate::types::MessageRole;

/// One server-sent event of a streamed chat completion.
///
/// The endpoint sends many of these; concatenating the `content` of every
/// delta in arrival order yields the assistant's reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionChunk {
    /// Identifier shared by every chunk of one completion.
    #[serde(default)]
    pub id: String,

    /// The model that produced the chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Usually exactly one choice; may be empty on usage-only chunks.
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

/// A single choice within a chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChunkChoice {
    /// Position of this choice.
    #[serde(default)]
    pub index: u32,

    /// The incremental piece of the message.
    #[serde(default)]
    pub delta: ChunkDelta,

    /// Why generation stopped, present on the final chunk only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Incremental update to the assistant message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChunkDelta {
    /// Set on the first chunk only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<MessageRole>,

    /// The text fragment carried by this chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    /// Create a chunk carrying a single text fragment.
    pub fn text(fragment: impl Into<String>) -> Self {
        Self {
            choices: vec![ChunkChoice {
                delta: ChunkDelta {
                    role: None,
                    content: Some(fragment.into()),
                },
                ..ChunkChoice::default()
            }],
            ..Self::default()
        }
    }

    /// The text fragment of the first choice, if it carries one.
    pub fn fragment(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
    }
}

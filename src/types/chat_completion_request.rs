use serde::{Deserialize, Serialize};

use crate::types::{Message, Model};

/// Body of a `POST chat/completions` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionRequest {
    /// The model that should answer.
    pub model: Model,

    /// The full conversation so far, oldest first.
    pub messages: Vec<Message>,

    /// Whether the endpoint should stream the answer as server-sent events.
    #[serde(default)]
    pub stream: bool,
}

impl ChatCompletionRequest {
    /// Create a new non-streaming request.
    pub fn new(model: Model, messages: Vec<Message>) -> Self {
        Self {
            model,
            messages,
            stream: false,
        }
    }

    /// Create a new streaming request.
    pub fn new_streaming(model: Model, messages: Vec<Message>) -> Self {
        Self {
            stream: true,
            ..Self::new(model, messages)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KnownModel;
    use serde_json::{json, to_value};

    #[test]
    fn streaming_request_serialization() {
        let request = ChatCompletionRequest::new_streaming(
            Model::Known(KnownModel::Gpt4o),
            vec![Message::user("hello")],
        );

        assert_eq!(
            to_value(&request).unwrap(),
            json!({
                "model": "gpt-4o",
                "messages": [{"role": "user", "content": "hello"}],
                "stream": true
            })
        );
    }
}

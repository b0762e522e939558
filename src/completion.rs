//! The completion capability: send the whole history, get one assistant message back.
//!
//! [`StreamingCompletion`] talks to the endpoint and prints the answer while it
//! arrives. [`MockCompletion`] answers with a canned reply and never touches the
//! network, which is what the orchestration tests run against.

use std::time::Instant;

use futures::{Stream, StreamExt, pin_mut};

use crate::client::OpenAi;
use crate::error::Result;
use crate::observability::{STREAM_CHUNKS, STREAM_DURATION};
use crate::render::Renderer;
use crate::types::{ChatCompletionChunk, ChatCompletionRequest, Message, Model};

/// Reply returned by [`MockCompletion::default`].
pub const MOCK_REPLY: &str = "Hello! How can I assist you today?";

/// Anything that can turn a conversation into the next assistant message.
#[async_trait::async_trait]
pub trait Completion: Send + Sync {
    /// Ask `model` for the message that follows `messages`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Upstream`] for any transport or protocol failure.
    async fn complete(
        &self,
        model: &Model,
        messages: &[Message],
        renderer: &mut dyn Renderer,
    ) -> Result<Message>;
}

/// Completion that streams the answer from the endpoint.
#[derive(Debug, Clone)]
pub struct StreamingCompletion {
    client: OpenAi,
}

impl StreamingCompletion {
    /// Wraps a configured client.
    pub fn new(client: OpenAi) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Completion for StreamingCompletion {
    async fn complete(
        &self,
        model: &Model,
        messages: &[Message],
        renderer: &mut dyn Renderer,
    ) -> Result<Message> {
        let request = ChatCompletionRequest::new_streaming(model.clone(), messages.to_vec());
        let stream = self.client.stream(request).await?;
        accumulate(stream, renderer).await
    }
}

/// Drain a chunk stream, rendering each fragment before the next is awaited.
///
/// Returns the assistant message holding every fragment in arrival order. On
/// error the fragments already rendered stay on screen and the error is
/// returned as-is.
pub async fn accumulate<S>(stream: S, renderer: &mut dyn Renderer) -> Result<Message>
where
    S: Stream<Item = Result<ChatCompletionChunk>>,
{
    pin_mut!(stream);
    let start = Instant::now();
    let mut content = String::new();

    renderer.start_response();
    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(err) => {
                renderer.finish_response();
                tracing::debug!(received = content.len(), error = %err, "completion stream aborted");
                return Err(err);
            }
        };
        STREAM_CHUNKS.click();
        if let Some(fragment) = chunk.fragment() {
            renderer.print_text(fragment);
            content.push_str(fragment);
        }
    }
    renderer.finish_response();
    STREAM_DURATION.add(start.elapsed().as_secs_f64());

    Ok(Message::assistant(content))
}

/// Deterministic completion for tests and offline runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCompletion {
    reply: String,
}

impl MockCompletion {
    /// Creates a mock that always answers with `reply`.
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

impl Default for MockCompletion {
    fn default() -> Self {
        Self::new(MOCK_REPLY)
    }
}

#[async_trait::async_trait]
impl Completion for MockCompletion {
    async fn complete(
        &self,
        _model: &Model,
        _messages: &[Message],
        _renderer: &mut dyn Renderer,
    ) -> Result<Message> {
        Ok(Message::assistant(self.reply.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::render::BufferRenderer;
    use crate::types::{ChunkChoice, ChunkDelta, MessageRole};
    use futures::stream;

    #[tokio::test]
    async fn accumulate_concatenates_in_order() {
        let chunks = vec![
            Ok(ChatCompletionChunk {
                choices: vec![ChunkChoice {
                    delta: ChunkDelta {
                        role: Some(MessageRole::Assistant),
                        content: None,
                    },
                    ..ChunkChoice::default()
                }],
                ..ChatCompletionChunk::default()
            }),
            Ok(ChatCompletionChunk::text("Hello")),
            Ok(ChatCompletionChunk::text(", ")),
            Ok(ChatCompletionChunk::text("world")),
            Ok(ChatCompletionChunk::default()),
        ];
        let mut renderer = BufferRenderer::new();

        let message = accumulate(stream::iter(chunks), &mut renderer).await.unwrap();

        assert_eq!(message, Message::assistant("Hello, world"));
        assert_eq!(renderer.fragments, vec!["Hello", ", ", "world"]);
        assert_eq!((renderer.started, renderer.finished), (1, 1));
    }

    #[tokio::test]
    async fn accumulate_empty_stream_yields_empty_reply() {
        let mut renderer = BufferRenderer::new();
        let chunks: Vec<Result<ChatCompletionChunk>> = Vec::new();

        let message = accumulate(stream::iter(chunks), &mut renderer).await.unwrap();

        assert_eq!(message, Message::assistant(""));
    }

    #[tokio::test]
    async fn accumulate_error_keeps_rendered_text() {
        let chunks = vec![
            Ok(ChatCompletionChunk::text("partial ")),
            Err(Error::upstream("connection reset", None)),
            Ok(ChatCompletionChunk::text("never seen")),
        ];
        let mut renderer = BufferRenderer::new();

        let err = accumulate(stream::iter(chunks), &mut renderer)
            .await
            .unwrap_err();

        assert!(err.is_upstream());
        assert_eq!(renderer.text, "partial ");
        assert_eq!(renderer.finished, 1);
    }

    #[tokio::test]
    async fn mock_ignores_model_and_history() {
        let mock = MockCompletion::default();
        let mut renderer = BufferRenderer::new();

        let reply = mock
            .complete(
                &Model::Custom("anything".to_string()),
                &[Message::user("hello"), Message::assistant("hi")],
                &mut renderer,
            )
            .await
            .unwrap();

        assert_eq!(reply, Message::assistant(MOCK_REPLY));
        assert!(renderer.text.is_empty());
    }

    async fn complete_against(status: &str, body: &str) -> (Result<Message>, BufferRenderer) {
        use crate::client::test_server::{response, serve_once};

        let (base_url, _server) = serve_once(response(
            status,
            &[("Content-Type", "text/event-stream")],
            body,
        ))
        .await;
        let client = OpenAi::with_options(Some("sk-test".to_string()), Some(base_url), None).unwrap();
        let completion = StreamingCompletion::new(client);
        let mut renderer = BufferRenderer::new();
        let result = completion
            .complete(&Model::default(), &[Message::user("hello")], &mut renderer)
            .await;
        (result, renderer)
    }

    #[tokio::test]
    async fn streaming_completion_renders_and_returns_reply() {
        let body = concat!(
            "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hal\"}}]}\n\n",
            "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"lo!\"}}]}\n\n",
            "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
            "data: [DONE]\n\n",
        );

        let (result, renderer) = complete_against("200 OK", body).await;

        assert_eq!(result.unwrap(), Message::assistant("Hallo!"));
        assert_eq!(renderer.fragments, vec!["Hal", "lo!"]);
        assert_eq!((renderer.started, renderer.finished), (1, 1));
    }

    #[tokio::test]
    async fn streaming_completion_reports_bare_error_body() {
        let body = r#"{"error":{"message":"quota exceeded","type":"insufficient_quota"}}"#;

        let (result, renderer) = complete_against("200 OK", body).await;

        let err = result.unwrap_err();
        assert!(err.is_upstream());
        assert!(err.to_string().contains("quota exceeded"));
        assert!(renderer.text.is_empty());
    }

    #[tokio::test]
    async fn streaming_completion_rejects_truncated_stream() {
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"Hal\"}}]}\n\n";

        let (result, renderer) = complete_against("200 OK", body).await;

        assert!(result.unwrap_err().is_upstream());
        assert_eq!(renderer.text, "Hal");
        assert_eq!(renderer.finished, 1);
    }
}

use std::env;
use std::time::{Duration, Instant};

use futures::Stream;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::sse::process_sse;
use crate::types::{ChatCompletionChunk, ChatCompletionRequest};

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/";
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Client for an OpenAI-compatible chat completions API.
#[derive(Debug, Clone)]
pub struct OpenAi {
    api_key: String,
    client: ReqwestClient,
    base_url: Url,
    timeout: Option<Duration>,
}

impl OpenAi {
    /// Create a new client against the default endpoint.
    ///
    /// The API key can be provided directly or read from the OPENAI_API_KEY
    /// environment variable.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    ///
    /// `timeout` bounds the whole request, including the time spent streaming
    /// the answer; `None` leaves it unbounded and only the connect is timed.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = match api_key {
            Some(key) => key,
            None => env::var(API_KEY_ENV).map_err(|_| {
                Error::authentication(format!(
                    "API key not provided and {API_KEY_ENV} environment variable not set"
                ))
            })?,
        };
        if HeaderValue::from_str(&format!("Bearer {api_key}")).is_err() {
            return Err(Error::authentication(
                "API key contains characters not allowed in a header",
            ));
        }

        let base_url = parse_base_url(base_url.as_deref().unwrap_or(DEFAULT_API_URL))?;

        let mut builder = ReqwestClient::builder().connect_timeout(DEFAULT_CONNECT_TIMEOUT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            Error::upstream(
                format!("Failed to build HTTP client: {}", e),
                Some(Box::new(e)),
            )
        })?;

        Ok(Self {
            api_key,
            client,
            base_url,
            timeout,
        })
    }

    /// The endpoint chat completions are posted to.
    pub fn completions_url(&self) -> Result<Url> {
        Ok(self.base_url.join("chat/completions")?)
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream"),
        );
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| Error::authentication("API key is not a valid header value"))?;
        headers.insert(header::AUTHORIZATION, bearer);
        Ok(headers)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|val| val.to_str().ok())
            .map(String::from);

        #[derive(Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        #[derive(Deserialize)]
        struct ErrorDetail {
            #[serde(rename = "type")]
            error_type: Option<String>,
            message: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::upstream(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        let detail = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.error);
        let message = match detail {
            Some(ErrorDetail {
                error_type: Some(error_type),
                message: Some(message),
            }) => format!("{error_type}: {message}"),
            Some(ErrorDetail {
                message: Some(message),
                ..
            }) => message,
            _ => error_body,
        };

        Error::upstream_status(status_code, message, request_id)
    }

    /// Send a chat completion request and get a streaming response.
    ///
    /// Returns a stream of chunks in the order the endpoint produced them.
    pub async fn stream(
        &self,
        mut request: ChatCompletionRequest,
    ) -> Result<impl Stream<Item = Result<ChatCompletionChunk>>> {
        request.stream = true;

        let url = self.completions_url()?;
        let start = Instant::now();
        CLIENT_REQUESTS.click();
        tracing::debug!(%url, model = %request.model, messages = request.messages.len(), "requesting completion");

        let response = self
            .client
            .post(url)
            .headers(self.default_headers()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                CLIENT_REQUEST_ERRORS.click();
                if e.is_timeout() {
                    let seconds = self.timeout.map(|t| t.as_secs_f64()).unwrap_or_default();
                    Error::upstream(
                        format!("Request timed out after {seconds} seconds: {}", e),
                        Some(Box::new(e)),
                    )
                } else if e.is_connect() {
                    Error::upstream(format!("Connection error: {}", e), Some(Box::new(e)))
                } else {
                    Error::upstream(format!("Request failed: {}", e), Some(Box::new(e)))
                }
            })?;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            let err = Self::process_error_response(response).await;
            tracing::debug!(error = %err, "completion request rejected");
            return Err(err);
        }

        Ok(process_sse(response.bytes_stream()))
    }
}

/// Validate a base URL and make sure relative joins land beneath it.
fn parse_base_url(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|e| Error::url(format!("invalid base URL {base_url:?}: {e}"), Some(e)))?;
    if url.cannot_be_a_base() {
        return Err(Error::url(
            format!("base URL {base_url:?} cannot carry a path"),
            None,
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let client = OpenAi::new(Some("test-key".to_string())).unwrap();
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.base_url.as_str(), DEFAULT_API_URL);
        assert_eq!(client.timeout, None);

        let client = OpenAi::with_options(
            Some("test-key".to_string()),
            Some("https://custom-api.example.com/v2".to_string()),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(client.base_url.as_str(), "https://custom-api.example.com/v2/");
        assert_eq!(client.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn completions_url_joins_beneath_base() {
        let client = OpenAi::with_options(
            Some("k".to_string()),
            Some("http://localhost:8080/v1".to_string()),
            None,
        )
        .unwrap();
        assert_eq!(
            client.completions_url().unwrap().as_str(),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = OpenAi::with_options(Some("k".to_string()), Some("not a url".to_string()), None)
            .unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
    }

    #[test]
    fn api_key_with_newline_is_rejected() {
        let err = OpenAi::new(Some("bad\nkey".to_string())).unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn headers_carry_bearer_token() {
        let client = OpenAi::new(Some("sk-test".to_string())).unwrap();
        let headers = client.default_headers().unwrap();
        assert_eq!(headers[header::AUTHORIZATION], "Bearer sk-test");
        assert_eq!(headers[header::ACCEPT], "text/event-stream");
    }

    #[tokio::test]
    async fn error_status_becomes_upstream_error() {
        use super::test_server::{response, serve_once};
        use crate::types::{Message, Model};

        let body = r#"{"error":{"message":"Rate limit reached","type":"rate_limit_error"}}"#;
        let (base_url, server) = serve_once(response(
            "429 Too Many Requests",
            &[
                ("Content-Type", "application/json"),
                ("x-request-id", "req_abc123"),
            ],
            body,
        ))
        .await;
        let client = OpenAi::with_options(Some("sk-test".to_string()), Some(base_url), None).unwrap();

        let Err(err) = client
            .stream(ChatCompletionRequest::new(
                Model::default(),
                vec![Message::user("hi")],
            ))
            .await
        else {
            panic!("a 429 must not open a stream");
        };

        assert!(err.is_upstream());
        assert_eq!(err.status_code(), Some(429));
        assert_eq!(err.request_id(), Some("req_abc123"));
        assert!(
            err.to_string()
                .contains("rate_limit_error: Rate limit reached")
        );

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1/chat/completions HTTP/1.1"));
        let lowered = request.to_lowercase();
        assert!(lowered.contains("authorization: bearer sk-test"));
        assert!(request.contains(r#""stream":true"#));
        assert!(request.contains(r#""model":"gpt-4o""#));
    }

    #[tokio::test]
    async fn error_status_with_plain_body_keeps_body() {
        use super::test_server::{response, serve_once};
        use crate::types::{Message, Model};

        let (base_url, _server) =
            serve_once(response("502 Bad Gateway", &[], "upstream unavailable")).await;
        let client = OpenAi::with_options(Some("sk-test".to_string()), Some(base_url), None).unwrap();

        let Err(err) = client
            .stream(ChatCompletionRequest::new(
                Model::default(),
                vec![Message::user("hi")],
            ))
            .await
        else {
            panic!("a 502 must not open a stream");
        };

        assert_eq!(err.status_code(), Some(502));
        assert!(err.to_string().contains("upstream unavailable"));
    }
}

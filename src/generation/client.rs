use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by a chat-completion call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    /// 401 / 403 from the endpoint.
    #[error("authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    /// 429 Too Many Requests.
    #[error("rate limited (429): {message}")]
    RateLimited {
        retry_after: Option<Duration>,
        message: String,
    },

    /// Connection failure, timeout or broken transfer.
    #[error("network error: {0}")]
    Network(String),

    /// The response body did not contain the expected fields.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// 5xx from the endpoint.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Any other non-success status, e.g. 400 for an oversized prompt.
    #[error("request rejected ({status}): {message}")]
    Request { status: u16, message: String },
}

impl LlmError {
    /// Classifies a non-success HTTP status.
    pub fn from_status(status: StatusCode, body: &str, retry_after: Option<Duration>) -> Self {
        let message = error_message(body);
        let code = status.as_u16();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Auth {
                status: code,
                message,
            },
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited {
                retry_after,
                message,
            },
            s if s.is_server_error() => Self::Server {
                status: code,
                message,
            },
            _ => Self::Request {
                status: code,
                message,
            },
        }
    }

    /// Whether another attempt could succeed without changing the request.
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Network(_) | Self::Server { .. }
        )
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else if err.is_timeout() {
            Self::Network(format!("request timed out: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Extracts `error.message` from an OpenAI-style error body, falling back to the raw body.
fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        message: String,
    }

    serde_json::from_str::<ErrorBody>(body).map_or_else(
        |_| body.trim().chars().take(500).collect(),
        |parsed| parsed.error.message,
    )
}

/// A single chat-completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Parses a chat-completion response body and returns the first choice's content.
pub fn parse_completion(body: &str) -> Result<String, LlmError> {
    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::MalformedResponse(format!("invalid JSON: {e}")))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::MalformedResponse("no choices in response".to_string()))?;

    choice
        .message
        .content
        .ok_or_else(|| LlmError::MalformedResponse("choice has no message content".to_string()))
}

/// Something that turns a prompt into generated text.
///
/// [`LlmClient`] talks to a real endpoint; tests substitute a stub.
pub trait CompletionBackend: Send + Sync {
    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>>;
}

/// Bounded retry with exponential backoff for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first; `0` disables retrying.
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Upper bound on any single delay, including server `Retry-After` hints.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(300),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based).
    ///
    /// Never shorter than `retry_after`, never longer than `max_delay`.
    pub fn delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let backoff = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt.min(16)));
        retry_after
            .map_or(backoff, |hint| hint.max(backoff))
            .min(self.max_delay)
    }
}

/// Client for OpenAI-compatible `chat/completions` endpoints.
pub struct LlmClient {
    client: Client,
    url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl LlmClient {
    pub fn new(
        base_url: &str,
        api_key: String,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: completions_url(base_url),
            api_key,
            retry,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends `request`, retrying transient failures per the retry policy.
    pub async fn generate(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let mut attempt = 0;
        loop {
            match self.send_once(request).await {
                Ok(text) => return Ok(text),
                Err(err) if err.is_transient() && attempt < self.retry.max_retries => {
                    let retry_after = match &err {
                        LlmError::RateLimited { retry_after, .. } => *retry_after,
                        _ => None,
                    };
                    let delay = self.retry.delay(attempt, retry_after);
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying chat completion"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send_once(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let body = ChatCompletionRequest {
            model: &request.model,
            messages: [Message {
                role: "user",
                content: &request.prompt,
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        tracing::debug!(
            url = %self.url,
            model = %request.model,
            prompt_chars = request.prompt.len(),
            "sending chat completion"
        );

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status(status, &text, retry_after));
        }

        let text = response.text().await?;
        parse_completion(&text)
    }
}

impl CompletionBackend for LlmClient {
    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>> {
        Box::pin(self.generate(request))
    }
}

fn completions_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/chat/completions") {
        base.to_string()
    } else {
        format!("{base}/chat/completions")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    #[test]
    fn test_parse_completion_with_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Bonjour le monde"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "Bonjour le monde");
    }

    #[test]
    fn test_parse_completion_takes_first_choice() {
        let body = r#"{"choices":[{"message":{"content":"first"}},{"message":{"content":"second"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "first");
    }

    #[test]
    fn test_parse_completion_no_choices() {
        let result = parse_completion(r#"{"choices":[]}"#);
        assert!(matches!(result, Err(LlmError::MalformedResponse(_))));
    }

    #[test]
    fn test_parse_completion_null_content() {
        let result = parse_completion(r#"{"choices":[{"message":{"content":null}}]}"#);
        assert!(matches!(result, Err(LlmError::MalformedResponse(_))));
    }

    #[test]
    fn test_parse_completion_invalid_json() {
        let result = parse_completion("<html>Bad Gateway</html>");
        assert!(matches!(result, Err(LlmError::MalformedResponse(_))));
    }

    #[test]
    fn test_parse_completion_unicode_content() {
        let body = r#"{"choices":[{"message":{"content":"こんにちは"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "こんにちは");
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            LlmError::from_status(StatusCode::UNAUTHORIZED, "", None),
            LlmError::Auth { status: 401, .. }
        ));
        assert!(matches!(
            LlmError::from_status(StatusCode::FORBIDDEN, "", None),
            LlmError::Auth { status: 403, .. }
        ));
        assert!(matches!(
            LlmError::from_status(StatusCode::TOO_MANY_REQUESTS, "", Some(Duration::from_secs(3))),
            LlmError::RateLimited {
                retry_after: Some(d),
                ..
            } if d == Duration::from_secs(3)
        ));
        assert!(matches!(
            LlmError::from_status(StatusCode::BAD_GATEWAY, "", None),
            LlmError::Server { status: 502, .. }
        ));
        assert!(matches!(
            LlmError::from_status(StatusCode::BAD_REQUEST, "", None),
            LlmError::Request { status: 400, .. }
        ));
    }

    #[test]
    fn test_error_message_from_openai_body() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        let err = LlmError::from_status(StatusCode::UNAUTHORIZED, body, None);
        assert_eq!(
            err.to_string(),
            "authentication failed (401): Incorrect API key provided"
        );
    }

    #[test]
    fn test_transient_errors() {
        assert!(LlmError::Network("reset".into()).is_transient());
        assert!(
            LlmError::Server {
                status: 503,
                message: String::new()
            }
            .is_transient()
        );
        assert!(
            LlmError::RateLimited {
                retry_after: None,
                message: String::new()
            }
            .is_transient()
        );
        assert!(
            !LlmError::Auth {
                status: 401,
                message: String::new()
            }
            .is_transient()
        );
        assert!(!LlmError::MalformedResponse("x".into()).is_transient());
    }

    #[test]
    fn test_retry_delay_is_exponential() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(60),
        };
        assert_eq!(policy.delay(0, None), Duration::from_millis(100));
        assert_eq!(policy.delay(1, None), Duration::from_millis(200));
        assert_eq!(policy.delay(3, None), Duration::from_millis(800));
    }

    #[test]
    fn test_retry_delay_honors_retry_after() {
        let policy = RetryPolicy {
            max_retries: 1,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(60),
        };
        assert_eq!(
            policy.delay(0, Some(Duration::from_secs(2))),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn test_retry_delay_is_capped() {
        let policy = RetryPolicy {
            max_retries: 20,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        };
        assert_eq!(
            policy.delay(0, Some(Duration::from_secs(86_400))),
            Duration::from_secs(30)
        );
        assert_eq!(policy.delay(16, None), Duration::from_secs(30));
    }

    #[test]
    fn test_completions_url() {
        assert_eq!(
            completions_url("https://api.openai.com/v1"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            completions_url("http://localhost:11434/v1/"),
            "http://localhost:11434/v1/chat/completions"
        );
        assert_eq!(
            completions_url("https://example.com/v1/chat/completions"),
            "https://example.com/v1/chat/completions"
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let client = LlmClient::new(
            "http://127.0.0.1:9/v1",
            "key".to_string(),
            Duration::from_secs(5),
            RetryPolicy::default(),
        )
        .unwrap();

        let request = CompletionRequest {
            model: "test".to_string(),
            prompt: "hi".to_string(),
            max_tokens: 16,
            temperature: 0.0,
        };

        let result = client.generate(&request).await;
        assert!(matches!(result, Err(LlmError::Network(_))));
    }

    /// Serves one canned HTTP response per connection, in order, and counts requests.
    async fn serve(responses: Vec<String>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        tokio::spawn(async move {
            for response in responses {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                read_request(&mut socket).await;
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{addr}/v1"), hits)
    }

    /// Reads headers and a `Content-Length` body so the client sees a complete exchange.
    async fn read_request(socket: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let Ok(n) = socket.read(&mut chunk).await else {
                return;
            };
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    return;
                }
            }
        }
    }

    fn http_response(status: &str, extra_headers: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n{extra_headers}\r\n{body}",
            body.len()
        )
    }

    fn ok_response(content: &str) -> String {
        http_response(
            "200 OK",
            "",
            &format!(r#"{{"choices":[{{"message":{{"content":"{content}"}}}}]}}"#),
        )
    }

    fn rate_limited_response() -> String {
        http_response(
            "429 Too Many Requests",
            "Retry-After: 0\r\n",
            r#"{"error":{"message":"slow down"}}"#,
        )
    }

    fn client_for(url: &str, max_retries: u32) -> LlmClient {
        LlmClient::new(
            url,
            "key".to_string(),
            Duration::from_secs(5),
            RetryPolicy {
                max_retries,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(10),
            },
        )
        .unwrap()
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "test".to_string(),
            prompt: "hi".to_string(),
            max_tokens: 16,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried_then_succeeds() {
        let (url, hits) = serve(vec![rate_limited_response(), ok_response("done")]).await;

        let result = client_for(&url, 1).generate(&request()).await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_without_retries_fails_once() {
        let (url, hits) = serve(vec![rate_limited_response(), ok_response("unused")]).await;

        let result = client_for(&url, 0).generate(&request()).await;

        assert!(matches!(
            result,
            Err(LlmError::RateLimited {
                retry_after: Some(d),
                ..
            }) if d == Duration::ZERO
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_auth_failure_is_not_retried() {
        let unauthorized = http_response(
            "401 Unauthorized",
            "",
            r#"{"error":{"message":"Incorrect API key provided"}}"#,
        );
        let (url, hits) = serve(vec![unauthorized, ok_response("unused")]).await;

        let result = client_for(&url, 3).generate(&request()).await;

        assert_eq!(
            result,
            Err(LlmError::Auth {
                status: 401,
                message: "Incorrect API key provided".to_string(),
            })
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_error_exhausts_retries() {
        let unavailable = http_response("503 Service Unavailable", "", "overloaded");
        let (url, hits) = serve(vec![unavailable.clone(), unavailable.clone(), unavailable]).await;

        let result = client_for(&url, 2).generate(&request()).await;

        assert!(matches!(result, Err(LlmError::Server { status: 503, .. })));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_success_body_without_choices_is_malformed() {
        let (url, _) = serve(vec![http_response("200 OK", "", r#"{"choices":[]}"#)]).await;

        let result = client_for(&url, 2).generate(&request()).await;

        assert!(matches!(result, Err(LlmError::MalformedResponse(_))));
    }
}

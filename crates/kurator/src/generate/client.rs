use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use serde_json::{json, Value};

use crate::config::Config;
use crate::enumerate::ObjectWorkItem;
use crate::store::DescriptionRecord;

use super::error::GenerationError;
use super::payload::PayloadBuilder;
use super::response;
use super::retry::{RetryPolicy, Sleeper, TokioSleeper};

/// Result of one chat request, already classified by the transport.
#[derive(Debug)]
pub enum ChatOutcome {
    /// The answer text of the first choice.
    Success { text: String },
    /// Provider rate limit, optionally with its own wait hint.
    RateLimited { retry_after: Option<Duration> },
    /// Server-side failure or unreachable provider.
    Unavailable { reason: String },
    /// Non-transient rejection; retrying cannot help.
    Fatal { reason: String },
}

/// One chat request against the provider. The retry loop sits above
/// this seam, so transports never retry themselves.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, body: &Value) -> ChatOutcome;
}

/// Transport for an OpenAI-compatible chat completions endpoint.
pub struct HttpChatTransport {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl HttpChatTransport {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url,
            api_key,
        }
    }

    fn classify_error(e: reqwest::Error) -> ChatOutcome {
        if e.is_timeout() || e.is_connect() {
            ChatOutcome::Unavailable {
                reason: e.to_string(),
            }
        } else {
            ChatOutcome::Fatal {
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn send(&self, body: &Value) -> ChatOutcome {
        let response = match self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Self::classify_error(e),
        };

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return ChatOutcome::RateLimited { retry_after };
        }

        if status.is_server_error() {
            return ChatOutcome::Unavailable {
                reason: format!("server returned {status}"),
            };
        }

        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return ChatOutcome::Fatal {
                reason: format!("server returned {status}: {detail}"),
            };
        }

        let payload: Value = match response.json().await {
            Ok(payload) => payload,
            Err(e) => {
                return ChatOutcome::Fatal {
                    reason: format!("malformed response body: {e}"),
                }
            }
        };

        match payload["choices"][0]["message"]["content"].as_str() {
            Some(text) => ChatOutcome::Success {
                text: text.to_string(),
            },
            None => ChatOutcome::Fatal {
                reason: "response carries no message content".to_string(),
            },
        }
    }
}

/// Produces one complete description record per work item.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(
        &self,
        item: &ObjectWorkItem,
    ) -> Result<DescriptionRecord, GenerationError>;
}

/// [`GenerationClient`] for OpenAI-compatible chat models with
/// exponential-backoff retry on transient failures.
pub struct OpenAiClient<T: ChatTransport> {
    transport: T,
    model: String,
    temperature: f32,
    payload: PayloadBuilder,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl OpenAiClient<HttpChatTransport> {
    pub fn from_config(config: &Config, api_key: String) -> Self {
        Self::new(
            HttpChatTransport::new(config.generation.api_url.clone(), api_key),
            config,
            Arc::new(TokioSleeper),
        )
    }
}

impl<T: ChatTransport> OpenAiClient<T> {
    pub fn new(transport: T, config: &Config, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            transport,
            model: config.generation.model.clone(),
            temperature: config.generation.temperature,
            payload: PayloadBuilder::new(
                config.generation.prompt_template.clone(),
                config.resize_max_side,
            ),
            retry: RetryPolicy::from_config(&config.retry),
            sleeper,
        }
    }

    fn request_body(&self, content: Vec<Value>) -> Value {
        json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [{ "role": "user", "content": content }],
        })
    }
}

#[async_trait]
impl<T: ChatTransport> GenerationClient for OpenAiClient<T> {
    async fn generate(
        &self,
        item: &ObjectWorkItem,
    ) -> Result<DescriptionRecord, GenerationError> {
        let body = self.request_body(self.payload.build(item)?);

        // Tracks which transient failure to report if every attempt fails.
        let mut rate_limited = false;
        let mut retry_hint: Option<Duration> = None;

        for attempt in 0..self.retry.max_attempts {
            if attempt > 0 {
                let backoff = self.retry.delay_for(attempt - 1);
                let delay = match retry_hint.take() {
                    Some(hint) => backoff.max(hint),
                    None => backoff,
                };
                debug!(
                    "Object {}: retry {} after {:.1}s",
                    item.object_id,
                    attempt,
                    delay.as_secs_f64()
                );
                self.sleeper.sleep(delay).await;
            }

            match self.transport.send(&body).await {
                ChatOutcome::Success { text } => {
                    return response::parse_record(&item.object_id, &text);
                }
                ChatOutcome::RateLimited { retry_after } => {
                    warn!(
                        "Object {}: rate limited on attempt {}",
                        item.object_id,
                        attempt + 1
                    );
                    rate_limited = true;
                    retry_hint = retry_after;
                }
                ChatOutcome::Unavailable { reason } => {
                    warn!(
                        "Object {}: service unavailable on attempt {}: {}",
                        item.object_id,
                        attempt + 1,
                        reason
                    );
                    rate_limited = false;
                }
                ChatOutcome::Fatal { reason } => {
                    return Err(GenerationError::Fatal(reason));
                }
            }
        }

        let attempts = self.retry.max_attempts;
        if rate_limited {
            Err(GenerationError::RateLimited { attempts })
        } else {
            Err(GenerationError::ServiceUnavailable { attempts })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ObjectMetadata;
    use image::{ImageBuffer, Rgb};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Transport that replays a fixed sequence of outcomes.
    struct ScriptedTransport {
        script: Mutex<Vec<ChatOutcome>>,
        calls: Mutex<u32>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<ChatOutcome>) -> Self {
            Self {
                script: Mutex::new(script),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ChatTransport for &ScriptedTransport {
        async fn send(&self, _body: &Value) -> ChatOutcome {
            *self.calls.lock().unwrap() += 1;
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                ChatOutcome::Fatal {
                    reason: "script exhausted".to_string(),
                }
            } else {
                script.remove(0)
            }
        }
    }

    struct RecordingSleeper {
        delays: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                delays: Mutex::new(Vec::new()),
            })
        }

        fn delays(&self) -> Vec<Duration> {
            self.delays.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.delays.lock().unwrap().push(duration);
        }
    }

    fn answer() -> ChatOutcome {
        ChatOutcome::Success {
            text: r#"{"english": "An electric kettle.", "german": "Ein Wasserkocher.",
                "polish": "Czajnik.", "french": "Une bouilloire.",
                "source_info": "not available", "technical_details": "Chromed body.",
                "historical_context": "not available", "conservation_notes": "Minor scratches.",
                "exhibition_history": "not available", "bibliography": "not available"}"#
                .to_string(),
        }
    }

    fn test_item(dir: &TempDir) -> ObjectWorkItem {
        let path = dir.path().join("1-1997-0457-000-000.jpg");
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(16, 16, Rgb([90, 90, 90]));
        img.save(&path).unwrap();

        ObjectWorkItem {
            object_id: "1-1997-0457".to_string(),
            image_paths: vec![path],
            metadata: ObjectMetadata::for_object("1-1997-0457"),
        }
    }

    fn client(
        transport: &ScriptedTransport,
        sleeper: Arc<RecordingSleeper>,
    ) -> OpenAiClient<&ScriptedTransport> {
        let config = crate::config::load_config_from_str(
            r#"{
                "version": "1.0",
                "input_directories": ["archive"],
                "descriptions_table": "descriptions.jsonl"
            }"#,
        )
        .unwrap();
        OpenAiClient::new(transport, &config, sleeper)
    }

    #[tokio::test]
    async fn test_first_attempt_success_sleeps_never() {
        let tmp = TempDir::new().unwrap();
        let transport = ScriptedTransport::new(vec![answer()]);
        let sleeper = RecordingSleeper::new();

        let record = client(&transport, sleeper.clone())
            .generate(&test_item(&tmp))
            .await
            .unwrap();

        assert_eq!(record.english, "An electric kettle.");
        assert_eq!(transport.calls(), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_retries_with_growing_backoff() {
        let tmp = TempDir::new().unwrap();
        let transport = ScriptedTransport::new(vec![
            ChatOutcome::RateLimited { retry_after: None },
            ChatOutcome::RateLimited { retry_after: None },
            answer(),
        ]);
        let sleeper = RecordingSleeper::new();

        let record = client(&transport, sleeper.clone())
            .generate(&test_item(&tmp))
            .await
            .unwrap();

        assert_eq!(record.object_id, "1-1997-0457");
        assert_eq!(transport.calls(), 3);
        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_secs(2), Duration::from_secs(4)]
        );
    }

    #[tokio::test]
    async fn test_retry_after_hint_overrides_shorter_backoff() {
        let tmp = TempDir::new().unwrap();
        let transport = ScriptedTransport::new(vec![
            ChatOutcome::RateLimited {
                retry_after: Some(Duration::from_secs(10)),
            },
            answer(),
        ]);
        let sleeper = RecordingSleeper::new();

        client(&transport, sleeper.clone())
            .generate(&test_item(&tmp))
            .await
            .unwrap();

        assert_eq!(sleeper.delays(), vec![Duration::from_secs(10)]);
    }

    #[tokio::test]
    async fn test_exhausted_rate_limit_reports_attempt_count() {
        let tmp = TempDir::new().unwrap();
        let script = (0..6)
            .map(|_| ChatOutcome::RateLimited { retry_after: None })
            .collect();
        let transport = ScriptedTransport::new(script);
        let sleeper = RecordingSleeper::new();

        let err = client(&transport, sleeper.clone())
            .generate(&test_item(&tmp))
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::RateLimited { attempts: 6 }));
        assert_eq!(transport.calls(), 6);
        assert_eq!(sleeper.delays().len(), 5);
    }

    #[tokio::test]
    async fn test_exhausted_unavailable_reports_as_unavailable() {
        let tmp = TempDir::new().unwrap();
        let script = (0..6)
            .map(|_| ChatOutcome::Unavailable {
                reason: "server returned 503".to_string(),
            })
            .collect();
        let transport = ScriptedTransport::new(script);

        let err = client(&transport, RecordingSleeper::new())
            .generate(&test_item(&tmp))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GenerationError::ServiceUnavailable { attempts: 6 }
        ));
    }

    #[tokio::test]
    async fn test_fatal_outcome_stops_immediately() {
        let tmp = TempDir::new().unwrap();
        let transport = ScriptedTransport::new(vec![ChatOutcome::Fatal {
            reason: "invalid API key".to_string(),
        }]);
        let sleeper = RecordingSleeper::new();

        let err = client(&transport, sleeper.clone())
            .generate(&test_item(&tmp))
            .await
            .unwrap_err();

        assert!(err.aborts_run());
        assert_eq!(transport.calls(), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_backoff_is_capped_at_max_delay() {
        let tmp = TempDir::new().unwrap();
        let script = (0..6)
            .map(|_| ChatOutcome::Unavailable {
                reason: "timeout".to_string(),
            })
            .collect();
        let transport = ScriptedTransport::new(script);
        let sleeper = RecordingSleeper::new();

        let _ = client(&transport, sleeper.clone())
            .generate(&test_item(&tmp))
            .await;

        assert_eq!(
            sleeper.delays(),
            vec![
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8),
                Duration::from_secs(16),
                Duration::from_secs(30),
            ]
        );
    }
}

//! HTTP Connector for QuakeSense - Event Ingest API
//!
//! ## Overview
//!
//! The ingest server accepts one event per `POST` on
//! [`SEISMIC_EVENT_PATH`](crate::SEISMIC_EVENT_PATH). The body is whatever
//! the publisher's codec produced: a JSON envelope (`application/json`) or an
//! Avro datum (`avro/binary`).
//!
//! ## Implementation Choices
//!
//! We keep this small:
//! - `ureq` as the client: blocking, no runtime, works on a Raspberry Pi
//!   class gateway as well as a server
//! - The sync [`Connector`] path makes one attempt per call; the edge loop
//!   must never stall on a dead network
//! - The [`AsyncConnector`] path retries transport errors, 5xx and 429 with
//!   exponential backoff capped at `backoff_max_ms`; 4xx is final
//!
//! ## Example Usage
//!
//! ```no_run
//! use quakesense_connectors::http::{HttpConfig, HttpConnector};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpConfig::new("https://quakes.example.org")
//!     .bearer_token("station-token")
//!     .timeout_ms(3_000)
//!     .max_retries(4);
//!
//! let http = HttpConnector::new(config)?;
//! let reply = http
//!     .post("/api/seismic-event", &serde_json::json!({"device_id": "ESP32-01"}))
//!     .await?;
//! println!("{}", reply);
//! # Ok(())
//! # }
//! ```

use crate::{AsyncConnector, ConnectionStats, Connector};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;

/// Failures of the ingest `POST`
#[derive(Debug, Error)]
pub enum HttpError {
    /// Connection, DNS or timeout failure before a status arrived
    #[error("transport: {0}")]
    Request(String),

    /// Ingest server answered with a non-2xx status
    #[error("ingest server returned {status}: {message}")]
    ServerError {
        /// Status code
        status: u16,
        /// Response body, if any
        message: String,
    },

    /// Body or reply was not the expected JSON
    #[error("bad JSON: {0}")]
    Serialization(String),

    /// Unusable settings
    #[error("http config: {0}")]
    Config(String),
}

impl HttpError {
    /// Whether another attempt might succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            HttpError::Request(_) => true,
            HttpError::ServerError { status, .. } => *status >= 500 || *status == 429,
            HttpError::Serialization(_) | HttpError::Config(_) => false,
        }
    }
}

/// Where and how events are posted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Scheme, host and port of the ingest server
    pub base_url: String,
    /// Per-request timeout (ms)
    pub timeout_ms: u64,
    /// Credentials sent with every request
    pub auth: AuthMethod,
    /// Extra headers, sent in name order
    pub headers: BTreeMap<String, String>,
    /// Extra attempts on the async path
    pub max_retries: u32,
    /// Delay before the first retry (ms), doubled per attempt
    pub backoff_base_ms: u64,
    /// Ceiling on a single backoff delay (ms)
    pub backoff_max_ms: u64,
    /// `User-Agent` value
    pub user_agent: String,
}

/// Credentials for the ingest server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthMethod {
    /// Open endpoint
    None,
    /// `Authorization: Bearer <token>`
    Bearer {
        /// Token value
        token: String,
    },
    /// `Authorization: Basic <base64(user:pass)>`
    Basic {
        /// User name
        username: String,
        /// Password
        password: String,
    },
    /// Key in a custom header
    ApiKey {
        /// Header name
        header: String,
        /// Header value
        value: String,
    },
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::new("http://localhost:5000")
    }
}

impl HttpConfig {
    /// Defaults for the server at `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            base_url: url.into(),
            timeout_ms: 5_000,
            auth: AuthMethod::None,
            headers: BTreeMap::new(),
            max_retries: 3,
            backoff_base_ms: 100,
            backoff_max_ms: 5_000,
            user_agent: format!("QuakeSense/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Authenticate with a bearer token
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.auth = AuthMethod::Bearer { token: token.into() };
        self
    }

    /// Authenticate with user and password
    pub fn basic_auth(mut self, user: impl Into<String>, pass: impl Into<String>) -> Self {
        self.auth = AuthMethod::Basic {
            username: user.into(),
            password: pass.into(),
        };
        self
    }

    /// Authenticate with a key sent in `header`
    pub fn api_key(mut self, header: impl Into<String>, key: impl Into<String>) -> Self {
        self.auth = AuthMethod::ApiKey {
            header: header.into(),
            value: key.into(),
        };
        self
    }

    /// Per-request timeout
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// Set the retry budget of the async path
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the backoff base and ceiling
    pub fn backoff_ms(mut self, base: u64, max: u64) -> Self {
        self.backoff_base_ms = base;
        self.backoff_max_ms = max;
        self
    }

    /// Send `name: value` with every request
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Check the settings
    pub fn validate(&self) -> Result<(), HttpError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(HttpError::Config("base_url needs an http:// or https:// scheme".into()));
        }
        if self.timeout_ms == 0 {
            return Err(HttpError::Config("timeout_ms must be positive".into()));
        }
        if self.backoff_base_ms > self.backoff_max_ms {
            return Err(HttpError::Config("backoff_base_ms exceeds backoff_max_ms".into()));
        }
        Ok(())
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor).min(self.backoff_max_ms))
    }
}

/// Posts encoded events to the ingest server with a shared `ureq` agent
#[derive(Clone)]
pub struct HttpConnector {
    config: HttpConfig,
    agent: ureq::Agent,
    stats: Arc<Mutex<ConnectionStats>>,
}

impl HttpConnector {
    /// Connector for a validated configuration
    pub fn new(config: HttpConfig) -> Result<Self, HttpError> {
        config.validate()?;

        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(&config.user_agent)
            .build();

        Ok(Self {
            config,
            agent,
            stats: Arc::default(),
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    fn stats_lock(&self) -> MutexGuard<'_, ConnectionStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// `POST` to `path` carrying credentials and extra headers
    fn build_request(&self, path: &str, content_type: &str) -> ureq::Request {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let mut request = self.agent.post(&url);

        match &self.config.auth {
            AuthMethod::None => {}
            AuthMethod::Bearer { token } => {
                request = request.set("Authorization", &format!("Bearer {}", token));
            }
            AuthMethod::Basic { username, password } => {
                let credentials =
                    base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", username, password));
                request = request.set("Authorization", &format!("Basic {}", credentials));
            }
            AuthMethod::ApiKey { header, value } => {
                request = request.set(header, value);
            }
        }

        for (name, value) in &self.config.headers {
            request = request.set(name, value);
        }

        request.set("Content-Type", content_type).set("Accept", "application/json")
    }

    /// One blocking `POST`, returning the parsed reply (`Null` when empty)
    fn post_once(request: ureq::Request, body: &[u8]) -> Result<serde_json::Value, HttpError> {
        match request.send_bytes(body) {
            Ok(resp) => {
                let text = resp.into_string().map_err(|e| HttpError::Request(e.to_string()))?;
                if text.trim().is_empty() {
                    return Ok(serde_json::Value::Null);
                }
                serde_json::from_str(&text).map_err(|e| HttpError::Serialization(e.to_string()))
            }
            Err(ureq::Error::Status(status, resp)) => Err(HttpError::ServerError {
                status,
                message: resp.into_string().unwrap_or_default(),
            }),
            Err(ureq::Error::Transport(e)) => Err(HttpError::Request(e.to_string())),
        }
    }

    /// Blocking single-attempt `POST` of raw bytes
    pub fn post_bytes(&self, path: &str, body: &[u8], content_type: &str) -> Result<serde_json::Value, HttpError> {
        let result = Self::post_once(self.build_request(path, content_type), body);
        self.record(&result, body.len());
        result
    }

    /// `POST` a serializable value with retries
    pub async fn post<T: Serialize>(&self, path: &str, data: &T) -> Result<serde_json::Value, HttpError> {
        let json = serde_json::to_vec(data).map_err(|e| HttpError::Serialization(e.to_string()))?;
        self.post_bytes_with_retry(path, json, "application/json").await
    }

    /// `POST` raw bytes with retries
    ///
    /// The blocking client runs on the runtime's blocking pool.
    pub async fn post_bytes_with_retry(
        &self,
        path: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<serde_json::Value, HttpError> {
        let body = Arc::new(body);
        let request = self.build_request(path, content_type);
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                self.stats_lock().retries += 1;
                tokio::time::sleep(self.config.backoff_delay(attempt)).await;
            }

            let req = request.clone();
            let payload = Arc::clone(&body);
            let result = tokio::task::spawn_blocking(move || Self::post_once(req, &payload))
                .await
                .unwrap_or_else(|e| Err(HttpError::Request(e.to_string())));

            match result {
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    log::debug!("POST {} attempt {} failed: {}", path, attempt + 1, e);
                    attempt += 1;
                }
                result => {
                    self.record(&result, body.len());
                    return result;
                }
            }
        }
    }

    fn record(&self, result: &Result<serde_json::Value, HttpError>, bytes: usize) {
        let mut stats = self.stats_lock();
        match result {
            Ok(_) => stats.record_sent(bytes),
            Err(e) => stats.record_failed(e),
        }
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> ConnectionStats {
        self.stats_lock().clone()
    }
}

impl Connector for HttpConnector {
    type Error = HttpError;

    fn send(&mut self, topic: &str, data: &[u8]) -> Result<(), Self::Error> {
        Connector::send_typed(self, topic, data, "application/json")
    }

    fn send_typed(&mut self, topic: &str, data: &[u8], content_type: &str) -> Result<(), Self::Error> {
        self.post_bytes(topic, data, content_type).map(|_| ())
    }

    fn is_connected(&self) -> bool {
        true
    }
}

#[async_trait::async_trait]
impl AsyncConnector for HttpConnector {
    type Error = HttpError;

    async fn send(&mut self, topic: &str, data: &[u8]) -> Result<(), Self::Error> {
        AsyncConnector::send_typed(self, topic, data, "application/json").await
    }

    async fn send_typed(&mut self, topic: &str, data: &[u8], content_type: &str) -> Result<(), Self::Error> {
        self.post_bytes_with_retry(topic, data.to_vec(), content_type)
            .await
            .map(|_| ())
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn stats(&self) -> ConnectionStats {
        HttpConnector::stats(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_compose() {
        let config = HttpConfig::new("https://quakes.example.org")
            .bearer_token("station-7")
            .timeout_ms(2_500)
            .max_retries(1)
            .header("X-Station", "north");

        assert_eq!(config.timeout_ms, 2_500);
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.headers.get("X-Station").map(String::as_str), Some("north"));
        assert_eq!(config.auth, AuthMethod::Bearer { token: "station-7".into() });
        assert!(config.user_agent.starts_with("QuakeSense/"));
    }

    #[test]
    fn invalid_settings_are_rejected_up_front() {
        assert!(matches!(HttpConnector::new(HttpConfig::new("quakes.example.org")), Err(HttpError::Config(_))));
        assert!(HttpConnector::new(HttpConfig::new("http://10.0.0.5:5000")).is_ok());
        assert!(HttpConfig::new("http://x").timeout_ms(0).validate().is_err());
        assert!(HttpConfig::new("http://x").backoff_ms(500, 100).validate().is_err());
    }

    #[test]
    fn backoff_doubles_up_to_the_cap() {
        let config = HttpConfig::new("http://x").backoff_ms(100, 1_000);
        let delays: Vec<u64> = (1..=5).map(|a| config.backoff_delay(a).as_millis() as u64).collect();
        assert_eq!(delays, [100, 200, 400, 800, 1_000]);
        assert_eq!(config.backoff_delay(80), Duration::from_millis(1_000));
    }

    #[test]
    fn only_transient_failures_are_retried() {
        let status = |status| HttpError::ServerError {
            status,
            message: String::new(),
        };
        assert!(HttpError::Request("connection reset".into()).is_retryable());
        assert!(status(502).is_retryable());
        assert!(status(429).is_retryable());
        assert!(!status(400).is_retryable());
        assert!(!status(401).is_retryable());
        assert!(!HttpError::Serialization("eof".into()).is_retryable());
    }

    #[test]
    fn partial_json_config_keeps_defaults() {
        let config: HttpConfig = serde_json::from_str(
            r#"{"base_url": "https://q.example", "auth": {"type": "api_key", "header": "X-Key", "value": "k"}}"#,
        )
        .unwrap();
        assert_eq!(config.timeout_ms, 5_000);
        assert_eq!(config.backoff_max_ms, 5_000);
        assert_eq!(
            config.auth,
            AuthMethod::ApiKey {
                header: "X-Key".into(),
                value: "k".into()
            }
        );
    }
}

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value as JsonValue};
use tokio::time::sleep;

use crate::{
    error::parse_retry_after,
    logs::Logs,
    options::env_var,
    types::{
        Bans, CommandLog, CommandResponse, JoinLog, KillLog, ModCall, Player, RadioCall, Robbery,
        ServerStatus, Vehicle,
    },
    ClientOptions, ErlcError, Result, TokenBucket,
};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.policeroleplay.community/v1";

/// Header carrying the private server key.
const SERVER_KEY_HEADER: &str = "Server-Key";

const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);
const SERVER_UNAVAILABLE_MESSAGE: &str = "Server data temporarily unavailable";

#[derive(Clone)]
/// HTTP client for the ER:LC private server API.
///
/// Clones share the same rate limiter.
pub struct ErlcClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    options: ClientOptions,
    limiter: Option<Arc<TokenBucket>>,
}

impl fmt::Debug for ErlcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErlcClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("options", &self.options)
            .finish()
    }
}

impl ErlcClient {
    /// Creates a client for the production API with default options.
    ///
    /// Fails if `api_key` is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    /// Creates a client against a custom API root, e.g. a proxy or mock server.
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ErlcError::Validation("API key is required".to_owned()));
        }
        let options = ClientOptions::default();
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key,
            limiter: TokenBucket::from_mode(&options.rate_limit).map(Arc::new),
            options,
        })
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `ERLC_API_KEY` — private server key (required)
    /// - `ERLC_BASE_URL` — API root, defaults to [`DEFAULT_BASE_URL`]
    /// - `ERLC_RATE_LIMIT`, `ERLC_MAX_RETRIES`, `ERLC_TIMEOUT_MS` — see
    ///   [`ClientOptions::from_env`]
    ///
    /// # Example
    ///
    /// ```no_run
    /// use erlc_http::ErlcClient;
    ///
    /// let client = ErlcClient::from_env().expect("missing ERLC_API_KEY");
    /// ```
    pub fn from_env() -> Result<Self> {
        let api_key = env_var("ERLC_API_KEY").ok_or_else(|| {
            ErlcError::Validation("missing ERLC_API_KEY environment variable".to_owned())
        })?;
        let base_url = env_var("ERLC_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        let options = ClientOptions::from_env()?;
        Ok(Self::with_base_url(base_url, api_key)?.with_options(options))
    }

    /// Applies rate limiting, timeout and retry options.
    ///
    /// Replaces the rate limiter, so clones made earlier keep the old one.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.limiter = TokenBucket::from_mode(&opts.rate_limit).map(Arc::new);
        self.options = opts;
        self
    }

    /// Options currently in effect.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// The admission gate, absent when rate limiting is disabled.
    pub fn rate_limiter(&self) -> Option<&TokenBucket> {
        self.limiter.as_deref()
    }

    /// Groups the log endpoints.
    pub fn logs(&self) -> Logs<'_> {
        Logs::new(self)
    }

    /// Server name, owners, player counts and join key (`/server`).
    pub async fn server(&self) -> Result<ServerStatus> {
        let value = self.request(Method::GET, "/server", None).await?;
        decode::<Option<ServerStatus>>("/server", value)?
            .ok_or_else(|| ErlcError::Decode("empty response for /server".to_owned()))
    }

    /// Players currently in the server (`/server/players`).
    pub async fn players(&self) -> Result<Vec<Player>> {
        self.get_list("/server/players").await
    }

    /// User IDs waiting to join (`/server/queue`).
    pub async fn queue(&self) -> Result<Vec<u64>> {
        self.get_list("/server/queue").await
    }

    /// Banned players keyed by user ID (`/server/bans`).
    pub async fn bans(&self) -> Result<Bans> {
        let value = self.request(Method::GET, "/server/bans", None).await?;
        Ok(decode::<Option<Bans>>("/server/bans", value)?.unwrap_or_default())
    }

    /// Vehicles spawned in the server (`/server/vehicles`).
    pub async fn vehicles(&self) -> Result<Vec<Vehicle>> {
        self.get_list("/server/vehicles").await
    }

    /// Robbery locations and their alarm state (`/server/robberies`).
    pub async fn robberies(&self) -> Result<Vec<Robbery>> {
        self.get_list("/server/robberies").await
    }

    /// Recent kills (`/server/killlogs`).
    pub async fn kill_logs(&self) -> Result<Vec<KillLog>> {
        self.get_list("/server/killlogs").await
    }

    /// Recent admin commands (`/server/commandlogs`).
    pub async fn command_logs(&self) -> Result<Vec<CommandLog>> {
        self.get_list("/server/commandlogs").await
    }

    /// Recent moderator calls (`/server/modcalls`).
    pub async fn mod_calls(&self) -> Result<Vec<ModCall>> {
        self.get_list("/server/modcalls").await
    }

    /// Recent radio calls (`/server/radiocalls`).
    pub async fn radio_calls(&self) -> Result<Vec<RadioCall>> {
        self.get_list("/server/radiocalls").await
    }

    /// Recent joins and leaves (`/server/joinlogs`).
    pub async fn join_logs(&self) -> Result<Vec<JoinLog>> {
        self.get_list("/server/joinlogs").await
    }

    /// Runs an in-game admin command, e.g. `":h Hello"`.
    ///
    /// An empty command is rejected before the rate limiter is touched.
    pub async fn execute_command(&self, command: &str) -> Result<CommandResponse> {
        if command.trim().is_empty() {
            return Err(ErlcError::Validation(
                "command must be a non-empty string".to_owned(),
            ));
        }
        let body = json!({ "command": command });
        let value = self
            .request(Method::POST, "/server/command", Some(&body))
            .await?;
        Ok(decode::<Option<CommandResponse>>("/server/command", value)?.unwrap_or_default())
    }

    /// Performs one API call and returns the parsed body.
    ///
    /// Every attempt takes a token from the rate limiter. `429` responses
    /// are retried up to `max_retries` times after the `Retry-After` delay.
    /// An empty success body yields `null`; a non-JSON one is wrapped as
    /// `{"message": <text>}`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&JsonValue>,
    ) -> Result<JsonValue> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt = 0usize;
        loop {
            if let Some(limiter) = &self.limiter {
                limiter.acquire().await;
            }

            let mut request = self
                .http
                .request(method.clone(), &url)
                .header(SERVER_KEY_HEADER, &self.api_key)
                .header(header::ACCEPT, "application/json")
                .header(header::CONTENT_TYPE, "application/json")
                .timeout(Duration::from_millis(self.options.timeout_ms));
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await.map_err(classify_transport)?;
            let status = response.status();
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);
            let text = response.text().await.map_err(classify_transport)?;

            if status.is_success() {
                return Ok(parse_success_body(&text));
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt < self.options.max_retries {
                    let delay = retry_after
                        .as_deref()
                        .and_then(parse_retry_after)
                        .unwrap_or(DEFAULT_RETRY_AFTER);

                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        "{} {} rate limited, retry {} after {} ms",
                        method,
                        path,
                        attempt + 1,
                        delay.as_millis()
                    );

                    sleep(delay).await;
                    attempt += 1;
                    continue;
                }

                let body = parse_error_body(&text);
                return Err(ErlcError::RateLimited {
                    message: body
                        .message
                        .unwrap_or_else(|| "Rate limit exceeded".to_owned()),
                    retry_after,
                });
            }

            #[cfg(feature = "tracing")]
            tracing::debug!("{} {} failed with status {}", method, path, status);

            return Err(classify_status(status, path, &text));
        }
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let value = self.request(Method::GET, path, None).await?;
        Ok(decode::<Option<Vec<T>>>(path, value)?.unwrap_or_default())
    }
}

fn decode<T: DeserializeOwned>(path: &str, value: JsonValue) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|err| ErlcError::Decode(format!("invalid response for {path}: {err}")))
}

fn classify_transport(err: reqwest::Error) -> ErlcError {
    if err.is_timeout() {
        ErlcError::timeout()
    } else {
        ErlcError::network(&err)
    }
}

fn parse_success_body(text: &str) -> JsonValue {
    if text.trim().is_empty() {
        return JsonValue::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| json!({ "message": text }))
}

#[derive(Debug, Default, PartialEq)]
struct ErrorBody {
    message: Option<String>,
    detail: Option<String>,
}

/// Extracts `message` and `error`/`code` from an error body, falling back
/// to the raw text as the message.
fn parse_error_body(text: &str) -> ErrorBody {
    let raw = text.trim();
    if raw.is_empty() {
        return ErrorBody::default();
    }
    match serde_json::from_str::<JsonValue>(raw) {
        Ok(JsonValue::Object(map)) => ErrorBody {
            message: map.get("message").map(json_to_text),
            detail: map
                .get("error")
                .or_else(|| map.get("code"))
                .map(json_to_text),
        },
        Ok(JsonValue::String(message)) => ErrorBody {
            message: Some(message),
            detail: None,
        },
        _ => ErrorBody {
            message: Some(raw.to_owned()),
            detail: None,
        },
    }
}

fn json_to_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn classify_status(status: StatusCode, path: &str, text: &str) -> ErlcError {
    let ErrorBody { message, detail } = parse_error_body(text);
    match status {
        StatusCode::BAD_REQUEST => ErlcError::Api {
            status: 400,
            message: format!(
                "Bad request: {}",
                message.as_deref().unwrap_or("Unknown error")
            ),
            detail,
        },
        StatusCode::FORBIDDEN => ErlcError::Authentication,
        StatusCode::NOT_FOUND => ErlcError::Api {
            status: 404,
            message: format!("Not found: {path}"),
            detail,
        },
        StatusCode::INTERNAL_SERVER_ERROR => ErlcError::Api {
            status: 500,
            message: format!(
                "Internal server error: {}",
                message.as_deref().unwrap_or("Unknown error")
            ),
            detail,
        },
        StatusCode::SERVICE_UNAVAILABLE => ErlcError::ServerUnavailable {
            message: message.unwrap_or_else(|| SERVER_UNAVAILABLE_MESSAGE.to_owned()),
        },
        other => ErlcError::Api {
            status: other.as_u16(),
            message: message.unwrap_or_else(|| {
                other
                    .canonical_reason()
                    .map(str::to_owned)
                    .unwrap_or_else(|| format!("HTTP {}", other.as_u16()))
            }),
            detail,
        },
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::json;

    use super::{classify_status, parse_error_body, parse_success_body, ErlcClient};
    use crate::ErlcError;

    #[test]
    fn rejects_empty_api_key() {
        let err = ErlcClient::new("  ").expect_err("empty key must fail");
        assert!(matches!(err, ErlcError::Validation(_)));
    }

    #[test]
    fn debug_redacts_api_key() {
        let client = ErlcClient::new("secret-key").unwrap();
        let debug = format!("{client:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-key"));
    }

    #[test]
    fn success_body_parsing() {
        assert_eq!(parse_success_body(""), serde_json::Value::Null);
        assert_eq!(parse_success_body("{\"a\":1}"), json!({"a": 1}));
        assert_eq!(parse_success_body("ok"), json!({"message": "ok"}));
    }

    #[test]
    fn error_body_prefers_json_fields() {
        let body = parse_error_body(r#"{"message":"bad command","error":"E_CMD"}"#);
        assert_eq!(body.message.as_deref(), Some("bad command"));
        assert_eq!(body.detail.as_deref(), Some("E_CMD"));

        let body = parse_error_body(r#"{"message":"nope","code":4001}"#);
        assert_eq!(body.detail.as_deref(), Some("4001"));

        let body = parse_error_body("plain failure");
        assert_eq!(body.message.as_deref(), Some("plain failure"));
        assert_eq!(body.detail, None);
    }

    #[test]
    fn forbidden_ignores_body() {
        let err = classify_status(StatusCode::FORBIDDEN, "/server", r#"{"message":"x"}"#);
        assert!(matches!(err, ErlcError::Authentication));
    }

    #[test]
    fn unclassified_status_keeps_raw_code() {
        let err = classify_status(StatusCode::IM_A_TEAPOT, "/server", "");
        assert_eq!(err.status(), Some(418));
        assert_eq!(err.message(), "I'm a teapot");
    }
}

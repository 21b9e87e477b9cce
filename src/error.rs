use std::time::Duration;

/// Fixed message carried by [`ErlcError::Authentication`].
pub const AUTHENTICATION_MESSAGE: &str = "Invalid API key or unauthorized access";

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum ErlcError {
    /// Generic API failure.
    ///
    /// Also used for transport failures (status `0`) and per-attempt
    /// timeouts (status `408`).
    #[error("api error {status}: {message}")]
    Api {
        status: u16,
        message: String,
        /// Machine-readable detail from the response body, if any.
        detail: Option<String>,
    },
    /// The API kept answering `429` after all retries were spent.
    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        /// Raw `Retry-After` header value of the last response.
        retry_after: Option<String>,
    },
    /// The API rejected the server key (`403`).
    #[error("{}", AUTHENTICATION_MESSAGE)]
    Authentication,
    /// The API has no server data to serve right now (`503`).
    #[error("server unavailable: {message}")]
    ServerUnavailable { message: String },
    /// Input rejected before any request was sent.
    #[error("invalid input: {0}")]
    Validation(String),
    /// Successful response that does not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
}

impl ErlcError {
    pub(crate) fn timeout() -> Self {
        Self::Api {
            status: 408,
            message: "Request timed out".to_owned(),
            detail: None,
        }
    }

    pub(crate) fn network(err: &reqwest::Error) -> Self {
        Self::Api {
            status: 0,
            message: format!("Network error: {err}"),
            detail: None,
        }
    }

    /// HTTP-equivalent status code. `None` for client-side failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            Self::Authentication => Some(403),
            Self::ServerUnavailable { .. } => Some(503),
            Self::Validation(_) | Self::Decode(_) => None,
        }
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        match self {
            Self::Api { message, .. }
            | Self::RateLimited { message, .. }
            | Self::ServerUnavailable { message } => message,
            Self::Authentication => AUTHENTICATION_MESSAGE,
            Self::Validation(message) | Self::Decode(message) => message,
        }
    }

    /// Machine-readable detail of an [`ErlcError::Api`] failure.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Api { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Raw `Retry-After` value of an [`ErlcError::RateLimited`] failure.
    pub fn retry_after(&self) -> Option<&str> {
        match self {
            Self::RateLimited { retry_after, .. } => retry_after.as_deref(),
            _ => None,
        }
    }

    /// Parsed `Retry-After` hint in seconds.
    pub fn retry_after_duration(&self) -> Option<Duration> {
        self.retry_after().and_then(parse_retry_after)
    }

    /// `true` when a request attempt exceeded its timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Api { status: 408, .. })
    }
}

pub(crate) fn parse_retry_after(value: &str) -> Option<Duration> {
    let seconds = value.trim().parse::<f64>().ok()?;
    Duration::try_from_secs_f64(seconds).ok()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{parse_retry_after, ErlcError, AUTHENTICATION_MESSAGE};

    #[test]
    fn status_per_kind() {
        assert_eq!(ErlcError::timeout().status(), Some(408));
        assert_eq!(ErlcError::Authentication.status(), Some(403));
        assert_eq!(
            ErlcError::ServerUnavailable {
                message: "down".to_owned()
            }
            .status(),
            Some(503)
        );
        assert_eq!(ErlcError::Validation("x".to_owned()).status(), None);
    }

    #[test]
    fn authentication_message_is_fixed() {
        let err = ErlcError::Authentication;
        assert_eq!(err.message(), AUTHENTICATION_MESSAGE);
        assert_eq!(err.to_string(), AUTHENTICATION_MESSAGE);
        assert_eq!(err.detail(), None);
    }

    #[test]
    fn retry_after_parses_seconds() {
        let err = ErlcError::RateLimited {
            message: "slow down".to_owned(),
            retry_after: Some("2".to_owned()),
        };
        assert_eq!(err.retry_after(), Some("2"));
        assert_eq!(err.retry_after_duration(), Some(Duration::from_secs(2)));
        assert_eq!(parse_retry_after("0.5"), Some(Duration::from_millis(500)));
        assert_eq!(parse_retry_after("soon"), None);
        assert_eq!(parse_retry_after("-1"), None);
        assert_eq!(parse_retry_after("1e20"), None);
        assert_eq!(parse_retry_after("inf"), None);
    }

    #[test]
    fn timeout_is_distinct_from_network() {
        assert!(ErlcError::timeout().is_timeout());
        let network = ErlcError::Api {
            status: 0,
            message: "Network error: refused".to_owned(),
            detail: None,
        };
        assert!(!network.is_timeout());
    }
}

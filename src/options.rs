use std::{str::FromStr, time::Duration};

use crate::ErlcError;

/// Client-side admission control applied before every request attempt.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RateLimitMode {
    /// Bursts of up to 10 requests, refilling at roughly 29 per second.
    #[default]
    Auto,
    /// No client-side throttling.
    Disabled,
    /// Exactly one request per interval, no burst.
    Interval(Duration),
}

impl RateLimitMode {
    /// Builds an interval mode from a number of seconds.
    pub fn every_secs(seconds: f64) -> Result<Self, ErlcError> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(ErlcError::Validation(format!(
                "rate limit interval must be a positive number of seconds, got {seconds}"
            )));
        }
        Duration::try_from_secs_f64(seconds)
            .map(Self::Interval)
            .map_err(|err| {
                ErlcError::Validation(format!(
                    "rate limit interval of {seconds} seconds is out of range: {err}"
                ))
            })
    }
}

/// Parses `"auto"`, `"none"` or a positive number of seconds.
impl FromStr for RateLimitMode {
    type Err = ErlcError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        if value.eq_ignore_ascii_case("none") {
            return Ok(Self::Disabled);
        }
        let seconds = value.parse::<f64>().map_err(|_| {
            ErlcError::Validation(format!(
                "rate limit must be \"auto\", \"none\" or seconds, got {value:?}"
            ))
        })?;
        Self::every_secs(seconds)
    }
}

/// Configures rate limiting, timeout and retry behavior.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientOptions {
    pub rate_limit: RateLimitMode,
    /// Maximum number of retries after a `429` response.
    pub max_retries: usize,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitMode::Auto,
            max_retries: 3,
            timeout_ms: 10_000,
        }
    }
}

impl ClientOptions {
    /// Reads `ERLC_RATE_LIMIT`, `ERLC_MAX_RETRIES` and `ERLC_TIMEOUT_MS`,
    /// falling back to defaults for unset variables.
    pub fn from_env() -> Result<Self, ErlcError> {
        let mut options = Self::default();
        if let Some(value) = env_var("ERLC_RATE_LIMIT") {
            options.rate_limit = value.parse()?;
        }
        if let Some(value) = env_var("ERLC_MAX_RETRIES") {
            options.max_retries = value.trim().parse().map_err(|_| {
                ErlcError::Validation(format!("ERLC_MAX_RETRIES is not a count: {value:?}"))
            })?;
        }
        if let Some(value) = env_var("ERLC_TIMEOUT_MS") {
            options.timeout_ms = value.trim().parse().map_err(|_| {
                ErlcError::Validation(format!("ERLC_TIMEOUT_MS is not a number: {value:?}"))
            })?;
        }
        Ok(options)
    }
}

pub(crate) fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{ClientOptions, RateLimitMode};

    #[test]
    fn defaults() {
        let options = ClientOptions::default();
        assert_eq!(options.rate_limit, RateLimitMode::Auto);
        assert_eq!(options.max_retries, 3);
        assert_eq!(options.timeout_ms, 10_000);
    }

    #[test]
    fn parses_rate_limit_modes() {
        assert_eq!("auto".parse::<RateLimitMode>().unwrap(), RateLimitMode::Auto);
        assert_eq!(
            "NONE".parse::<RateLimitMode>().unwrap(),
            RateLimitMode::Disabled
        );
        assert_eq!(
            "2.5".parse::<RateLimitMode>().unwrap(),
            RateLimitMode::Interval(Duration::from_millis(2_500))
        );
    }

    #[test]
    fn rejects_bad_rate_limit() {
        assert!("fast".parse::<RateLimitMode>().is_err());
        assert!("0".parse::<RateLimitMode>().is_err());
        assert!("-3".parse::<RateLimitMode>().is_err());
        assert!(RateLimitMode::every_secs(f64::NAN).is_err());
        assert!("1e20".parse::<RateLimitMode>().is_err());
    }
}

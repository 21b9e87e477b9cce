//! `erlc-http` is an async HTTP client for the ER:LC private server API.
//!
//! Every call goes through one request pipeline:
//! - a token bucket ([`TokenBucket`]) that throttles request starts,
//! - a single HTTP attempt with a per-attempt timeout,
//! - bounded retries on `429 Too Many Requests`,
//! - classification of failures into [`ErlcError`].
//!
//! Typed accessors such as [`ErlcClient::players`] and
//! [`ErlcClient::execute_command`] sit on top of [`ErlcClient::request`].

mod client;
mod error;
mod logs;
mod options;
mod rate_limit;
mod types;

pub use client::{ErlcClient, DEFAULT_BASE_URL};
pub use error::{ErlcError, AUTHENTICATION_MESSAGE};
pub use logs::Logs;
pub use options::{ClientOptions, RateLimitMode};
pub use rate_limit::{TokenBucket, AUTO_CAPACITY, AUTO_REFILL_PER_MS};
pub use reqwest::Method;
pub use types::{
    Bans, CommandLog, CommandResponse, JoinLog, KillLog, ModCall, Player, RadioCall, Robbery,
    ServerStatus, Vehicle,
};

pub type Result<T> = std::result::Result<T, ErlcError>;

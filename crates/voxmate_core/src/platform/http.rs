//! Blocking HTTP seam for online handlers.
//!
//! # Invariants
//! - Every request has a 5 s timeout; there are no retries.
//! - Non-success statuses surface as [`OnlineError::Status`] so handlers can
//!   distinguish "not found" from transport failure.

use log::debug;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const USER_AGENT: &str = concat!("voxmate/", env!("CARGO_PKG_VERSION"));

/// Online call failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnlineError {
    /// The capability gating this call is off, or no client could be built.
    Unavailable,
    /// Transport failure (DNS, connect, timeout).
    Http(String),
    /// Server answered with a non-success status.
    Status(u16),
    /// Body did not have the expected shape.
    Decode(String),
}

impl Display for OnlineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable => write!(f, "online service unavailable"),
            Self::Http(message) => write!(f, "http request failed: {message}"),
            Self::Status(code) => write!(f, "http status {code}"),
            Self::Decode(message) => write!(f, "unexpected response: {message}"),
        }
    }
}

impl Error for OnlineError {}

/// HTTP GET seam.
pub trait HttpFetch {
    fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, OnlineError>;

    fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String, OnlineError>;
}

/// [`HttpFetch`] backed by `reqwest::blocking`.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::blocking::Client,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, OnlineError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| OnlineError::Http(err.to_string()))?;
        Ok(Self { client })
    }

    fn send(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<reqwest::blocking::Response, OnlineError> {
        debug!("event=http_get module=platform status=start url={}", url);
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(|err| OnlineError::Http(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            debug!(
                "event=http_get module=platform status=error url={} http_status={}",
                url,
                status.as_u16()
            );
            return Err(OnlineError::Status(status.as_u16()));
        }
        Ok(response)
    }
}

impl HttpFetch for ReqwestFetcher {
    fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, OnlineError> {
        self.send(url, query)?
            .json::<Value>()
            .map_err(|err| OnlineError::Decode(err.to_string()))
    }

    fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String, OnlineError> {
        self.send(url, query)?
            .text()
            .map_err(|err| OnlineError::Decode(err.to_string()))
    }
}

/// [`HttpFetch`] that always fails with [`OnlineError::Unavailable`].
///
/// Used when the HTTP client cannot be constructed at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFetcher;

impl HttpFetch for OfflineFetcher {
    fn get_json(&self, _url: &str, _query: &[(&str, &str)]) -> Result<Value, OnlineError> {
        Err(OnlineError::Unavailable)
    }

    fn get_text(&self, _url: &str, _query: &[(&str, &str)]) -> Result<String, OnlineError> {
        Err(OnlineError::Unavailable)
    }
}

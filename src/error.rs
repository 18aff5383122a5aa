//! Error types shared across the crate.
//!
//! [`ApiError`] is the single failure signal produced by the REST client and
//! consumed by the store. The boxed [`DynError`] alias and the [`Context`]
//! extension are used by the binary glue (terminal setup, config, logging).

use std::fmt::{Display, Formatter};

use thiserror::Error;

pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;
pub type Result<T> = std::result::Result<T, DynError>;

/// Message surfaced when a failure carries no text of its own.
pub const FALLBACK_ERROR_MESSAGE: &str = "An error occurred";

/// Failure of a single call against the users API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection refused, DNS failure, TLS error, body read failure, ...
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    /// The server answered with a non-2xx status.
    #[error("Request failed with status code {status}")]
    Status { status: u16, body: String },
    /// A by-id route answered 404.
    #[error("User {id} not found")]
    NotFound { id: String },
    /// The body could not be decoded into the expected record.
    #[error("Failed to parse {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// The configured base URL cannot be joined with a route.
    #[error("Invalid API URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ApiError {
    /// Human-readable text for the status line or an inline error view.
    pub fn user_message(&self) -> String {
        let msg = self.to_string();
        if msg.trim().is_empty() {
            FALLBACK_ERROR_MESSAGE.to_string()
        } else {
            msg
        }
    }

    /// HTTP status code when the server did answer.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Decode { .. } | Self::InvalidUrl { .. } => None,
        }
    }
}

pub trait Context<T> {
    fn with_ctx<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

#[derive(Debug)]
pub struct WithContextError {
    pub context: String,
    pub source: DynError,
}

impl Display for WithContextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.context, self.source)
    }
}

impl std::error::Error for WithContextError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

impl<T, E> Context<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_ctx<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            Box::new(WithContextError {
                context: f(),
                source: e.into(),
            }) as DynError
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_reads_like_an_http_client_message() {
        let err = ApiError::Status {
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(err.user_message(), "Request failed with status code 500");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn not_found_reports_404() {
        let err = ApiError::NotFound { id: "abc".into() };
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.user_message(), "User abc not found");
    }

    #[test]
    fn with_ctx_prefixes_the_source_message() {
        let res: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::other("disk on fire"));
        let err = res.with_ctx(|| "write config".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "write config: disk on fire");
    }
}

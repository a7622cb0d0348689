//! Error types for the Mailchimp API client.
//!
//! # Design
//! Every failure surfaces through one `Error` enum so callers can match on
//! the category. Non-2xx responses keep the raw `HttpResponse` and the parsed
//! problem document (when Mailchimp sent one) so nothing about the failure is
//! lost. Transport failures keep the underlying error as `source`.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::http::HttpResponse;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned while building, dispatching, or parsing a request.
#[derive(Debug, Error)]
pub enum Error {
    /// The API key has no `-<datacenter>` suffix and no datacenter was given.
    #[error("missing or invalid api key")]
    InvalidCredentials,

    #[error("No request options given")]
    MissingRequestOptions,

    #[error("No path given")]
    MissingPath,

    /// Base URL plus path did not form a valid URL.
    #[error("invalid request url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The request body could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The HTTP round-trip itself failed (connect, TLS, I/O, ...).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with a status outside 200..=299.
    #[error(transparent)]
    Http(Box<HttpError>),

    /// A 2xx response carried a body that is not JSON.
    #[error("response body with status {status} is not valid JSON: {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// HTTP status attached to the failure, if there is one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Transport(err) => err.status,
            Error::Http(err) => Some(err.status),
            Error::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response attached to the failure, if the server answered.
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            Error::Http(err) => Some(&err.response),
            _ => None,
        }
    }
}

/// Failure reported by a `Transport` before any response was available.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    pub status: Option<u16>,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// A non-2xx response from the API.
#[derive(Debug)]
pub struct HttpError {
    pub status: u16,
    /// Response body as JSON. Raw text if the body is not JSON, the status
    /// number if the body is empty.
    pub body: Value,
    /// Problem document, when the body is one.
    pub problem: Option<Problem>,
    pub response: HttpResponse,
}

impl HttpError {
    pub fn from_response(response: HttpResponse) -> Self {
        let status = response.status;
        let body = if response.body.trim().is_empty() {
            Value::from(status)
        } else {
            serde_json::from_str(&response.body)
                .unwrap_or_else(|_| Value::String(response.body.clone()))
        };
        let problem = serde_json::from_value::<Problem>(body.clone())
            .ok()
            .filter(|p| p.title.is_some() || p.detail.is_some());
        Self {
            status,
            body,
            problem,
            response,
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        match &self.problem {
            Some(Problem {
                title: Some(title),
                detail: Some(detail),
                ..
            }) => write!(f, ": {title}: {detail}"),
            Some(Problem { title: Some(text), .. }) | Some(Problem { detail: Some(text), .. }) => {
                write!(f, ": {text}")
            }
            _ => match &self.body {
                Value::String(text) => write!(f, ": {text}"),
                Value::Number(_) => Ok(()),
                other => write!(f, ": {other}"),
            },
        }
    }
}

impl std::error::Error for HttpError {}

/// Mailchimp's JSON error body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Problem {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub title: Option<String>,
    pub status: Option<u16>,
    pub detail: Option<String>,
    pub instance: Option<String>,
    #[serde(default)]
    pub errors: Vec<FieldError>,
}

/// Per-field validation failure inside a `Problem`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

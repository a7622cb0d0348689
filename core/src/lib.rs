//! Client core for the Mailchimp v3 REST API.
//!
//! # Overview
//! Builds authenticated `HttpRequest` values, resolves `{param}` path
//! templates, and normalizes `HttpResponse` values into JSON result maps or
//! typed errors. `Mailchimp` wraps that in an async API over a pluggable
//! `Transport`, with callback adapters for callers that prefer them.
//!
//! # Design
//! - `MailchimpClient` is stateless: credentials, API root and user agent are
//!   fixed at construction.
//! - Request building and response parsing are split (`build_request` /
//!   `parse_response`) so the I/O boundary is explicit and testable.
//! - One call, one round-trip: no retries, caching or rate limiting.
//!
//! ```no_run
//! # async fn demo() -> mailchimp_core::Result<()> {
//! use mailchimp_core::{Mailchimp, RequestOptions};
//!
//! let mailchimp = Mailchimp::new("0123456789abcdef-us6")?;
//! let members = mailchimp
//!     .get(RequestOptions::new("/lists/{list_id}/members").path_param("list_id", "a1b2c3"))
//!     .await?;
//! println!("{}", members["statusCode"]);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod http;
pub mod mailchimp;
pub mod path;
pub mod transport;
pub mod types;

pub use client::MailchimpClient;
pub use config::ClientConfig;
pub use credentials::Credentials;
pub use error::{Error, HttpError, Problem, Result, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use mailchimp::Mailchimp;
pub use path::format_path;
pub use transport::{ReqwestTransport, Transport};
pub use types::{RequestOptions, ResponseBody};

//! API key handling and datacenter resolution.
//!
//! Mailchimp keys look like `<key>-<datacenter>`; the datacenter picks the
//! API host for the account.

use std::fmt;

use crate::config::API_HOST_TEMPLATE;
use crate::error::{Error, Result};

/// API key plus the datacenter its account lives on.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    datacenter: String,
}

impl Credentials {
    /// Build from explicit parts, without inspecting the key.
    pub fn new(api_key: impl Into<String>, datacenter: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            datacenter: datacenter.into(),
        }
    }

    /// Parse a composite `<key>-<datacenter>` API key.
    ///
    /// An explicit `datacenter` skips key validation and wins over the key's
    /// suffix. Otherwise the key needs a hyphen with text on both sides and
    /// the datacenter is everything after the first hyphen.
    pub fn from_api_key(api_key: &str, datacenter: Option<&str>) -> Result<Self> {
        if let Some(dc) = datacenter {
            if dc.is_empty() {
                return Err(Error::InvalidCredentials);
            }
            return Ok(Self::new(api_key, dc));
        }

        match api_key.split_once('-') {
            Some((key, dc)) if !key.is_empty() && !dc.is_empty() => Ok(Self::new(api_key, dc)),
            _ => Err(Error::InvalidCredentials),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn datacenter(&self) -> &str {
        &self.datacenter
    }

    /// `https://{dc}.api.mailchimp.com/3.0`
    pub fn base_url(&self) -> String {
        API_HOST_TEMPLATE.replace("{dc}", &self.datacenter)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"[REDACTED]")
            .field("datacenter", &self.datacenter)
            .finish()
    }
}

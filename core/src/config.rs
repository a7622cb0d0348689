//! Client configuration and wire constants.

use crate::credentials::Credentials;

/// Per-account API root. `{dc}` is replaced with the datacenter.
pub const API_HOST_TEMPLATE: &str = "https://{dc}.api.mailchimp.com/3.0";

/// Basic-auth username. Mailchimp ignores it; only the password (API key)
/// is checked.
pub const BASIC_AUTH_USER: &str = "any";

/// Default `User-Agent` sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("mailchimp-core/", env!("CARGO_PKG_VERSION"));

/// Everything a `MailchimpClient` needs, fixed at construction.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub credentials: Credentials,
    /// Replaces the datacenter-derived API root, e.g. for a proxy or a mock.
    pub base_url: Option<String>,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            base_url: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Effective API root without a trailing slash.
    pub fn resolved_base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => self.credentials.base_url(),
        }
    }
}

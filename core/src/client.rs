//! Stateless HTTP request builder and response parser for the Mailchimp API.
//!
//! # Design
//! `MailchimpClient` holds only immutable credentials, the API root and the
//! user agent. `build_request` turns `RequestOptions` into an `HttpRequest`
//! and `parse_response` turns an `HttpResponse` into a `ResponseBody`. The
//! HTTP round-trip happens elsewhere, which keeps this part deterministic.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Value};
use url::Url;

use crate::config::{ClientConfig, BASIC_AUTH_USER};
use crate::credentials::Credentials;
use crate::error::{Error, HttpError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::path::format_path;
use crate::types::{RequestOptions, ResponseBody};

/// Key added to every successful result.
pub const STATUS_CODE_FIELD: &str = "statusCode";

/// Synchronous, stateless request builder / response parser.
#[derive(Debug, Clone)]
pub struct MailchimpClient {
    credentials: Credentials,
    base_url: String,
    user_agent: String,
}

impl MailchimpClient {
    /// Build from a composite API key and an optional datacenter override.
    pub fn new(api_key: &str, datacenter: Option<&str>) -> Result<Self> {
        let credentials = Credentials::from_api_key(api_key, datacenter)?;
        Ok(Self::from_config(ClientConfig::new(credentials)))
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            base_url: config.resolved_base_url(),
            credentials: config.credentials,
            user_agent: config.user_agent,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Resolve `options` into a ready-to-send request.
    pub fn build_request(&self, options: Option<&RequestOptions>) -> Result<HttpRequest> {
        let options = options.ok_or(Error::MissingRequestOptions)?;

        let path = format_path(&options.path, &options.path_params);
        if path.is_empty() {
            return Err(Error::MissingPath);
        }

        let method = options.method.unwrap_or(HttpMethod::Get);
        let body = options
            .body
            .clone()
            .unwrap_or_else(|| Value::Object(Map::new()));

        // Mailchimp ignores the language inside some bodies (confirmation
        // emails for new subscribers), so mirror it into the header.
        let language = options
            .language
            .as_deref()
            .filter(|lang| !lang.is_empty())
            .or_else(|| body.get("language").and_then(Value::as_str))
            .filter(|lang| !lang.is_empty())
            .map(str::to_owned);

        let mut headers = vec![
            ("user-agent".to_string(), self.user_agent.clone()),
            ("authorization".to_string(), self.basic_auth()),
            ("content-type".to_string(), "application/json".to_string()),
            ("accept".to_string(), "application/json".to_string()),
        ];
        if let Some(language) = language {
            headers.push(("accept-language".to_string(), language));
        }

        let url = self.build_url(&path, options.resolved_query())?;
        let body = serde_json::to_string(&body).map_err(Error::Serialization)?;

        Ok(HttpRequest {
            method,
            url,
            headers,
            body: Some(body),
        })
    }

    /// Turn a response into a result map, or an error for non-2xx statuses.
    pub fn parse_response(&self, response: HttpResponse) -> Result<ResponseBody> {
        if !(200..=299).contains(&response.status) {
            return Err(Error::Http(Box::new(HttpError::from_response(response))));
        }

        let mut result = if response.body.trim().is_empty() {
            Map::new()
        } else {
            let value: Value =
                serde_json::from_str(&response.body).map_err(|source| Error::Decode {
                    status: response.status,
                    source,
                })?;
            match value {
                Value::Object(map) => map,
                Value::Null => Map::new(),
                other => {
                    let mut map = Map::new();
                    map.insert("data".to_string(), other);
                    map
                }
            }
        };
        result.insert(STATUS_CODE_FIELD.to_string(), Value::from(response.status));
        Ok(result)
    }

    fn basic_auth(&self) -> String {
        let token = STANDARD.encode(format!("{BASIC_AUTH_USER}:{}", self.credentials.api_key()));
        format!("Basic {token}")
    }

    fn build_url(&self, path: &str, query: &[(String, String)]) -> Result<String> {
        let raw = format!("{}{path}", self.base_url);
        let mut url = Url::parse(&raw).map_err(|source| Error::InvalidUrl {
            url: raw.clone(),
            source,
        })?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url.to_string())
    }
}

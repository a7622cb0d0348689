//! Request options and result types.
//!
//! # Design
//! `RequestOptions` is the single input shape for every call. A bare path
//! converts into it through `From<&str>` / `From<String>`, which replaces
//! "string or options" argument sniffing with an ordinary conversion.
//! `query` and `params` are aliases; `query` wins when both are set.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::http::HttpMethod;
use crate::path::PathParams;

/// Parsed JSON response body with an injected `statusCode` field.
pub type ResponseBody = Map<String, Value>;

/// Ordered query-string pairs.
pub type QueryParams = Vec<(String, String)>;

/// Everything needed to describe one API call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    /// Path relative to the API root, may contain `{name}` placeholders.
    pub path: String,
    pub path_params: PathParams,
    /// Defaults to GET.
    pub method: Option<HttpMethod>,
    /// Defaults to `{}`.
    pub body: Option<Value>,
    pub query: Option<QueryParams>,
    /// Alias of `query`, used only when `query` is unset.
    pub params: Option<QueryParams>,
    /// Sent as `Accept-Language`; falls back to `body.language`.
    pub language: Option<String>,
}

impl RequestOptions {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn path_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.path_params.push((name.into(), value.to_string()));
        self
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query
            .get_or_insert_with(Vec::new)
            .push((name.into(), value.to_string()));
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params
            .get_or_insert_with(Vec::new)
            .push((name.into(), value.to_string()));
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// `query` if present, else `params`, else nothing.
    pub fn resolved_query(&self) -> &[(String, String)] {
        self.query
            .as_deref()
            .or(self.params.as_deref())
            .unwrap_or_default()
    }
}

impl From<&str> for RequestOptions {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for RequestOptions {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_path_converts_to_options() {
        let options = RequestOptions::from("lists");
        assert_eq!(options.path, "lists");
        assert!(options.method.is_none());
        assert!(options.body.is_none());
    }

    #[test]
    fn query_wins_over_params() {
        let options = RequestOptions::new("/lists")
            .param("count", 5)
            .query("offset", 10);
        assert_eq!(
            options.resolved_query(),
            &[("offset".to_string(), "10".to_string())]
        );
    }

    #[test]
    fn params_used_when_query_absent() {
        let options = RequestOptions::new("/lists").param("count", 5);
        assert_eq!(
            options.resolved_query(),
            &[("count".to_string(), "5".to_string())]
        );
        assert!(RequestOptions::new("/lists").resolved_query().is_empty());
    }

    #[test]
    fn deserializes_with_defaults() {
        let options: RequestOptions = serde_json::from_value(json!({
            "path": "/lists/{id}",
            "path_params": [["id", "abc"]],
            "method": "patch",
            "body": {"name": "x"}
        }))
        .unwrap();
        assert_eq!(options.method, Some(HttpMethod::Patch));
        assert_eq!(options.path_params, vec![("id".to_string(), "abc".to_string())]);
        assert!(options.query.is_none());
        assert!(options.language.is_none());
    }
}

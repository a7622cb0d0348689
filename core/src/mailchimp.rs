//! Async Mailchimp API handle.
//!
//! # Design
//! `Mailchimp` pairs an immutable `MailchimpClient` with a shared
//! `Transport`. Each call builds one request, executes it once and parses
//! the response; there is no retry and no shared mutable state, so the
//! handle is cheap to clone and safe to use from many tasks at once.
//!
//! The awaitable methods are the primary interface. The `*_with_callback`
//! methods spawn the same future on the current tokio runtime and hand the
//! outcome to a `FnOnce`, which makes "called exactly once" a type-level
//! guarantee.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::client::MailchimpClient;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::HttpMethod;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{RequestOptions, ResponseBody};

#[derive(Clone)]
pub struct Mailchimp {
    client: MailchimpClient,
    transport: Arc<dyn Transport>,
}

impl Mailchimp {
    /// Client for a composite `<key>-<dc>` API key over `reqwest`.
    pub fn new(api_key: &str) -> Result<Self> {
        let client = MailchimpClient::new(api_key, None)?;
        Ok(Self::with_transport(client, ReqwestTransport::new()))
    }

    pub fn with_datacenter(api_key: &str, datacenter: &str) -> Result<Self> {
        let client = MailchimpClient::new(api_key, Some(datacenter))?;
        Ok(Self::with_transport(client, ReqwestTransport::new()))
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self::with_transport(MailchimpClient::from_config(config), ReqwestTransport::new())
    }

    pub fn with_transport(client: MailchimpClient, transport: impl Transport + 'static) -> Self {
        Self {
            client,
            transport: Arc::new(transport),
        }
    }

    pub fn client(&self) -> &MailchimpClient {
        &self.client
    }

    /// Issue one request. `None` fails with `MissingRequestOptions`.
    pub async fn request(&self, options: impl Into<Option<RequestOptions>>) -> Result<ResponseBody> {
        let options = options.into();
        debug!(request_options = ?options, "mailchimp request");

        let request = self.client.build_request(options.as_ref())?;
        debug!(method = %request.method, url = %request.url, "dispatching");

        let response = self.transport.execute(request).await.map_err(|err| {
            warn!(error = %err, status = ?err.status, "mailchimp transport error");
            err
        })?;
        debug!(status = response.status, "mailchimp response");

        self.client.parse_response(response)
    }

    pub async fn get(&self, options: impl Into<RequestOptions>) -> Result<ResponseBody> {
        self.request(with_verb(options.into(), HttpMethod::Get, None))
            .await
    }

    /// POST; an explicit `body` replaces any body already on `options`.
    pub async fn post(
        &self,
        options: impl Into<RequestOptions>,
        body: Option<Value>,
    ) -> Result<ResponseBody> {
        self.request(with_verb(options.into(), HttpMethod::Post, body))
            .await
    }

    /// PATCH; an explicit `body` replaces any body already on `options`.
    pub async fn patch(
        &self,
        options: impl Into<RequestOptions>,
        body: Option<Value>,
    ) -> Result<ResponseBody> {
        self.request(with_verb(options.into(), HttpMethod::Patch, body))
            .await
    }

    /// Run `request` in the background and pass the outcome to `done`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn request_with_callback<F>(&self, options: impl Into<Option<RequestOptions>>, done: F)
    where
        F: FnOnce(Result<ResponseBody>) + Send + 'static,
    {
        let this = self.clone();
        let options = options.into();
        tokio::spawn(async move {
            let result = this.request(options).await;
            if let Err(err) = &result {
                debug!(mailchimp_err = %err, "request failed");
            }
            done(result);
        });
    }

    pub fn get_with_callback<F>(&self, options: impl Into<RequestOptions>, done: F)
    where
        F: FnOnce(Result<ResponseBody>) + Send + 'static,
    {
        self.request_with_callback(with_verb(options.into(), HttpMethod::Get, None), done);
    }

    pub fn post_with_callback<F>(
        &self,
        options: impl Into<RequestOptions>,
        body: Option<Value>,
        done: F,
    ) where
        F: FnOnce(Result<ResponseBody>) + Send + 'static,
    {
        self.request_with_callback(with_verb(options.into(), HttpMethod::Post, body), done);
    }

    pub fn patch_with_callback<F>(
        &self,
        options: impl Into<RequestOptions>,
        body: Option<Value>,
        done: F,
    ) where
        F: FnOnce(Result<ResponseBody>) + Send + 'static,
    {
        self.request_with_callback(with_verb(options.into(), HttpMethod::Patch, body), done);
    }
}

fn with_verb(mut options: RequestOptions, method: HttpMethod, body: Option<Value>) -> RequestOptions {
    options.method = Some(method);
    if let Some(body) = body {
        if options.body.is_some() {
            warn!("body set on request options overwritten by argument body");
        }
        options.body = Some(body);
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::error::{Error, TransportError};
    use crate::http::{HttpRequest, HttpResponse};

    type Reply = std::result::Result<HttpResponse, String>;

    /// Records requests and replies with a canned response.
    struct Recorder {
        seen: Arc<Mutex<Vec<HttpRequest>>>,
        reply: Reply,
    }

    #[async_trait]
    impl Transport for Recorder {
        async fn execute(
            &self,
            request: HttpRequest,
        ) -> std::result::Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push(request);
            self.reply.clone().map_err(TransportError::new)
        }
    }

    fn mailchimp(reply: Reply) -> (Mailchimp, Arc<Mutex<Vec<HttpRequest>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let client = MailchimpClient::new("key-us1", None).unwrap();
        let transport = Recorder {
            seen: seen.clone(),
            reply,
        };
        (Mailchimp::with_transport(client, transport), seen)
    }

    fn ok(status: u16, body: &str) -> Reply {
        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        })
    }

    fn sent_body(request: &HttpRequest) -> Value {
        serde_json::from_str(request.body.as_deref().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn post_forces_method_and_sets_body() {
        let (mc, seen) = mailchimp(ok(200, r#"{"id":"l1"}"#));
        let result = mc.post("/lists", Some(json!({"name": "x"}))).await.unwrap();
        assert_eq!(result["id"], "l1");
        assert_eq!(result["statusCode"], 200);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, HttpMethod::Post);
        assert_eq!(seen[0].url, "https://us1.api.mailchimp.com/3.0/lists");
        assert_eq!(sent_body(&seen[0]), json!({"name": "x"}));
    }

    #[tokio::test]
    async fn explicit_body_wins_over_options_body() {
        let (mc, seen) = mailchimp(ok(200, "{}"));
        let options = RequestOptions::new("/lists/{id}")
            .path_param("id", "abc")
            .method(HttpMethod::Delete)
            .body(json!({"name": "old"}));
        mc.patch(options, Some(json!({"name": "new"}))).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].method, HttpMethod::Patch);
        assert!(seen[0].url.ends_with("/lists/abc"));
        assert_eq!(sent_body(&seen[0]), json!({"name": "new"}));
    }

    #[tokio::test]
    async fn absent_body_keeps_options_body() {
        let (mc, seen) = mailchimp(ok(200, "{}"));
        let options = RequestOptions::new("/lists").body(json!({"name": "kept"}));
        mc.post(options, None).await.unwrap();
        assert_eq!(sent_body(&seen.lock().unwrap()[0]), json!({"name": "kept"}));
    }

    #[tokio::test]
    async fn missing_options_never_reaches_transport() {
        let (mc, seen) = mailchimp(ok(200, "{}"));
        let err = mc.request(None::<RequestOptions>).await.unwrap_err();
        assert!(matches!(err, Error::MissingRequestOptions));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_path_reaches_transport_as_root() {
        let (mc, seen) = mailchimp(ok(200, "{}"));
        mc.request(RequestOptions::new("")).await.unwrap();
        assert_eq!(seen.lock().unwrap()[0].url, "https://us1.api.mailchimp.com/3.0/");
    }

    #[tokio::test]
    async fn transport_failure_is_surfaced() {
        let (mc, _) = mailchimp(Err("connection reset".to_string()));
        let err = mc.get("/ping").await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(err.status_code(), None);
    }

    #[tokio::test]
    async fn callback_receives_success_once() {
        let (mc, _) = mailchimp(ok(200, r#"{"health_status":"ok"}"#));
        let (tx, rx) = tokio::sync::oneshot::channel();
        mc.get_with_callback("/ping", move |result| {
            tx.send(result).unwrap();
        });
        let result = rx.await.unwrap().unwrap();
        assert_eq!(result["health_status"], "ok");
    }

    #[tokio::test]
    async fn callback_receives_error() {
        let (mc, _) = mailchimp(ok(404, r#"{"title":"Resource Not Found"}"#));
        let (tx, rx) = tokio::sync::oneshot::channel();
        mc.post_with_callback("/lists/nope", None, move |result| {
            tx.send(result).unwrap();
        });
        let err = rx.await.unwrap().unwrap_err();
        assert_eq!(err.status_code(), Some(404));
    }
}

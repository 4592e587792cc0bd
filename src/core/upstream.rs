//! Upstream HTTP client shared by the handlers of one server.
//!
//! A single `reqwest` client is configured once per server with the base
//! URL, default headers and a fixed timeout, then injected into every
//! handler. All transport and status failures are classified here as
//! `UpstreamFailure`, so handlers only deal with successful payloads.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domains::tools::{ToolError, ToolResult};

/// How the credential is sent upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer <token>`
    Bearer,
    /// `Authorization: token <token>` (GitHub style)
    Token,
    /// A custom header carrying the raw token (e.g. `X-Subscription-Token`).
    Header(&'static str),
}

/// Builder for [`UpstreamClient`].
#[derive(Debug, Clone)]
pub struct UpstreamClientBuilder {
    service: String,
    base_url: String,
    accept: String,
    user_agent: String,
    timeout: Duration,
    credential: Option<(AuthScheme, String)>,
    extra_headers: Vec<(&'static str, String)>,
}

impl UpstreamClientBuilder {
    pub fn accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = accept.into();
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Attach a credential. `None` keeps the client usable for calls that
    /// do not need one; [`UpstreamClient::require_credential`] reports it.
    pub fn credential(mut self, scheme: AuthScheme, token: Option<String>) -> Self {
        self.credential = token
            .filter(|t| !t.trim().is_empty())
            .map(|t| (scheme, t));
        self
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.extra_headers.push((name, value.into()));
        self
    }

    pub fn build(self) -> ToolResult<UpstreamClient> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, header_value(&self.accept)?);
        headers.insert(USER_AGENT, header_value(&self.user_agent)?);

        let has_credential = self.credential.is_some();
        if let Some((scheme, token)) = &self.credential {
            let (name, value) = match scheme {
                AuthScheme::Bearer => (AUTHORIZATION, format!("Bearer {token}")),
                AuthScheme::Token => (AUTHORIZATION, format!("token {token}")),
                AuthScheme::Header(name) => (header_name(name)?, token.clone()),
            };
            let mut value = header_value(&value)?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }

        for (name, value) in &self.extra_headers {
            headers.insert(header_name(name)?, header_value(value)?);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(self.timeout)
            .build()
            .map_err(|e| ToolError::internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(UpstreamClient {
            service: self.service,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            timeout: self.timeout,
            has_credential,
            http,
        })
    }
}

fn header_value(value: &str) -> ToolResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| ToolError::internal(format!("Invalid header value: {e}")))
}

fn header_name(name: &str) -> ToolResult<HeaderName> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| ToolError::internal(format!("Invalid header name '{name}': {e}")))
}

/// HTTP client bound to one upstream API.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    service: String,
    base_url: String,
    timeout: Duration,
    has_credential: bool,
    http: reqwest::Client,
}

impl UpstreamClient {
    /// Start building a client for `service` rooted at `base_url`.
    pub fn builder(service: impl Into<String>, base_url: impl Into<String>) -> UpstreamClientBuilder {
        UpstreamClientBuilder {
            service: service.into(),
            base_url: base_url.into(),
            accept: "application/json".to_string(),
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(10),
            credential: None,
            extra_headers: Vec::new(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Same client and headers, different per-call timeout.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            timeout,
            ..self.clone()
        }
    }

    /// Fail with `Unauthorized` when no credential was configured.
    pub fn require_credential(&self, variable: &str) -> ToolResult<()> {
        if self.has_credential {
            Ok(())
        } else {
            Err(ToolError::unauthorized(format!(
                "{} credential missing: set {variable}",
                self.service
            )))
        }
    }

    /// Start a request to `path` (relative to the base URL).
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = if path.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        };
        debug!("{} {} {}", self.service, method, url);
        self.http.request(method, url).timeout(self.timeout)
    }

    /// Start a request to an absolute URL, without the base URL.
    pub fn request_url(&self, method: Method, url: &str) -> RequestBuilder {
        debug!("{} {} {}", self.service, method, url);
        self.http.request(method, url).timeout(self.timeout)
    }

    pub async fn get(&self, path: &str) -> ToolResult<Value> {
        self.send_json(self.request(Method::GET, path)).await
    }

    pub async fn get_json<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> ToolResult<Value> {
        self.send_json(self.request(Method::GET, path).query(query)).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ToolResult<Value> {
        self.send_json(self.request(Method::POST, path).json(body)).await
    }

    pub async fn put_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ToolResult<Value> {
        self.send_json(self.request(Method::PUT, path).json(body)).await
    }

    pub async fn patch_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ToolResult<Value> {
        self.send_json(self.request(Method::PATCH, path).json(body)).await
    }

    /// Send a request and decode a JSON body.
    ///
    /// An empty 2xx body (e.g. `204 No Content`) decodes to `null`.
    pub async fn send_json(&self, request: RequestBuilder) -> ToolResult<Value> {
        let (status, text) = self.send_text(request).await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| {
            ToolError::upstream(
                &self.service,
                Some(status),
                format!("invalid JSON in response: {e}"),
                text,
            )
        })
    }

    /// Send a request and return the status and body text of a 2xx response.
    pub async fn send_text(&self, request: RequestBuilder) -> ToolResult<(u16, String)> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;

        if status.is_success() {
            Ok((status.as_u16(), text))
        } else {
            let message = upstream_message(&text)
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            warn!("{} returned {}: {}", self.service, status, message);
            Err(ToolError::upstream(
                &self.service,
                Some(status.as_u16()),
                message,
                text,
            ))
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> ToolError {
        let message = if err.is_timeout() {
            format!("request timed out after {} ms", self.timeout.as_millis())
        } else if err.is_connect() {
            format!("connection failed: {err}")
        } else {
            err.to_string()
        };
        warn!("{} request failed: {}", self.service, message);
        ToolError::upstream(&self.service, err.status().map(|s| s.as_u16()), message, "")
    }
}

/// Pull a human message out of an upstream error body.
///
/// Recognizes `{"message": ..}`, `{"error": {"message": ..}}` and
/// `{"error": ".."}`.
pub fn upstream_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| value.pointer("/error/message").and_then(Value::as_str))
        .or_else(|| value.get("error").and_then(Value::as_str))
        .map(str::to_string)
}

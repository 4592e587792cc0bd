//! Generic HTTP fetch toolset.
//!
//! No credentials and no base URL: every call names an absolute http(s) URL.
//! Requests share one client; a call may shorten or extend the timeout.

pub mod html;
pub mod json;
pub mod raw;

use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Method, RequestBuilder, Url};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::upstream::UpstreamClient;
use crate::domains::tools::{ToolError, ToolRegistry, ToolResult};

pub use html::FetchHtmlTool;
pub use json::FetchJsonTool;
pub use raw::FetchTool;

pub const SERVICE: &str = "HTTP fetch";
pub const MAX_TIMEOUT_MS: u64 = 60_000;

pub fn client(config: &Config) -> ToolResult<UpstreamClient> {
    UpstreamClient::builder(SERVICE, "")
        .accept("*/*")
        .user_agent(&config.upstream.user_agent)
        .timeout(config.upstream.timeout())
        .build()
}

pub fn register(registry: &mut ToolRegistry, config: &Config) -> Result<()> {
    let client = client(config)?;
    registry.register(FetchTool::new(client.clone()))?;
    registry.register(FetchJsonTool::new(client.clone()))?;
    registry.register(FetchHtmlTool::new(client))?;
    Ok(())
}

/// Method, headers and timeout shared by the fetch tools.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct RequestOptions {
    /// HTTP method to use
    #[schemars(extend("enum" = ["GET", "POST", "PUT", "PATCH", "DELETE"], "default" = "GET"))]
    pub method: Option<String>,

    /// HTTP headers to include in the request
    pub headers: Option<Map<String, Value>>,

    /// Request timeout in milliseconds
    #[schemars(range(min = 1, max = 60000), extend("default" = 10000))]
    pub timeout: Option<u64>,
}

impl RequestOptions {
    /// Start a request to `url` with the validated method, caller headers
    /// and timeout.
    ///
    /// Returns the client the request must be sent through, so timeout
    /// errors report the per-call limit.
    pub fn start(
        &self,
        client: &UpstreamClient,
        url: &str,
    ) -> ToolResult<(UpstreamClient, RequestBuilder)> {
        let url = parse_url(url)?;
        let method = parse_method(self.method.as_deref())?;

        let client = match self.timeout {
            Some(ms) => client.with_timeout(Duration::from_millis(ms)),
            None => client.clone(),
        };

        let mut request = client.request_url(method, url.as_str());
        for (name, value) in self.headers.iter().flatten() {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(_) | Value::Bool(_) => value.to_string(),
                _ => {
                    return Err(ToolError::invalid_params(format!(
                        "header '{name}' must be a string"
                    )));
                }
            };
            let header = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                ToolError::invalid_params(format!("invalid header name '{name}'"))
            })?;
            let value = HeaderValue::from_str(&value).map_err(|_| {
                ToolError::invalid_params(format!("invalid value for header '{name}'"))
            })?;
            request = request.header(header, value);
        }
        Ok((client, request))
    }
}

/// Accept only absolute http and https URLs.
pub fn parse_url(raw: &str) -> ToolResult<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ToolError::invalid_params(format!("invalid URL '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ToolError::invalid_params(format!(
            "unsupported URL scheme '{scheme}' (only http and https are allowed)"
        ))),
    }
}

fn parse_method(method: Option<&str>) -> ToolResult<Method> {
    match method.map(|m| m.trim().to_uppercase()).as_deref() {
        None | Some("GET") => Ok(Method::GET),
        Some("POST") => Ok(Method::POST),
        Some("PUT") => Ok(Method::PUT),
        Some("PATCH") => Ok(Method::PATCH),
        Some("DELETE") => Ok(Method::DELETE),
        Some(other) => Err(ToolError::invalid_params(format!(
            "unsupported HTTP method '{other}'"
        ))),
    }
}

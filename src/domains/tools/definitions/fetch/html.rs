//! HTML fetch: plain GET, page returned as text.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, instrument};

use super::RequestOptions;
use crate::core::upstream::UpstreamClient;
use crate::domains::tools::{
    Arguments, InputSchema, ToolDescriptor, ToolHandler, ToolOutput, ToolResult, parse_args,
};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FetchHtmlParams {
    /// URL to fetch HTML content from
    pub url: String,
    /// Request timeout in milliseconds
    #[schemars(range(min = 1, max = 60000), extend("default" = 10000))]
    pub timeout: Option<u64>,
}

pub struct FetchHtmlTool {
    client: UpstreamClient,
}

impl FetchHtmlTool {
    pub const NAME: &'static str = "fetch_html";
    pub const DESCRIPTION: &'static str = "Fetch HTML content from a URL";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for FetchHtmlTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            InputSchema::for_type::<FetchHtmlParams>(),
        )
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: FetchHtmlParams = parse_args(arguments)?;
        let options = RequestOptions {
            timeout: params.timeout,
            ..Default::default()
        };
        let (client, request) = options.start(&self.client, &params.url)?;
        let request = request.header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml");

        let (_, html) = client.send_text(request).await?;
        info!("Fetched {} bytes of HTML from {}", html.len(), params.url);
        Ok(ToolOutput::text(html))
    }
}

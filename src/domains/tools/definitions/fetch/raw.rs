//! Raw fetch: any method, body returned as text.

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
pub struct FetchParams {
    /// URL to fetch data from
    pub url: String,
    #[serde(flatten)]
    pub options: RequestOptions,
    /// Body to include in the request (for POST, PUT, PATCH)
    pub body: Option<String>,
}

pub struct FetchTool {
    client: UpstreamClient,
}

impl FetchTool {
    pub const NAME: &'static str = "fetch";
    pub const DESCRIPTION: &'static str = "Fetch data from a URL";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for FetchTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            InputSchema::for_type::<FetchParams>(),
        )
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: FetchParams = parse_args(arguments)?;
        let (client, mut request) = params.options.start(&self.client, &params.url)?;
        if let Some(body) = params.body {
            request = request.body(body);
        }

        let (status, text) = client.send_text(request).await?;
        info!("Fetched {} ({}, {} bytes)", params.url, status, text.len());
        Ok(ToolOutput::text(text))
    }
}

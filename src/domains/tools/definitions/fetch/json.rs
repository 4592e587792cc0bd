//! JSON fetch: JSON request body, response must parse as JSON.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::instrument;

use super::RequestOptions;
use crate::core::upstream::UpstreamClient;
use crate::domains::tools::{
    Arguments, InputSchema, ToolDescriptor, ToolHandler, ToolOutput, ToolResult, parse_args,
};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FetchJsonParams {
    /// URL to fetch JSON data from
    pub url: String,
    #[serde(flatten)]
    pub options: RequestOptions,
    /// JSON body to include in the request (for POST, PUT, PATCH)
    #[schemars(with = "Option<Map<String, Value>>")]
    pub body: Option<Value>,
}

pub struct FetchJsonTool {
    client: UpstreamClient,
}

impl FetchJsonTool {
    pub const NAME: &'static str = "fetch_json";
    pub const DESCRIPTION: &'static str = "Fetch JSON data from a URL and parse it";

    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for FetchJsonTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            InputSchema::for_type::<FetchJsonParams>(),
        )
    }

    #[instrument(skip_all)]
    async fn call(&self, arguments: Arguments) -> ToolResult<ToolOutput> {
        let params: FetchJsonParams = parse_args(arguments)?;
        let (client, mut request) = params.options.start(&self.client, &params.url)?;
        request = request.header(reqwest::header::ACCEPT, "application/json");
        // Sets Content-Type only when the caller did not.
        if let Some(body) = &params.body {
            request = request.json(body);
        }

        let value = client.send_json(request).await?;
        Ok(ToolOutput::json(value))
    }
}

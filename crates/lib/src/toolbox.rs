//! Toolbox: the tool provider served over MCP.
//!
//! Exposes two tools, `get_time` and `calculate_bmi`. Faults inside a tool are returned as
//! `isError` results so the caller can show them in the conversation.

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo},
    serve_server, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BmiError {
    #[error("height_m must be greater than zero (got {0})")]
    InvalidHeight(f64),
    #[error("bmi is not a finite number")]
    NotFinite,
}

/// Local wall-clock time, e.g. `2026-10-18 09:30:12.345678`.
pub fn current_time() -> String {
    chrono::Local::now()
        .format("%Y-%m-%d %H:%M:%S%.6f")
        .to_string()
}

/// Body mass index: weight / height².
pub fn calculate_bmi(weight_kg: f64, height_m: f64) -> Result<f64, BmiError> {
    if height_m.is_nan() || height_m <= 0.0 {
        return Err(BmiError::InvalidHeight(height_m));
    }
    let bmi = weight_kg / (height_m * height_m);
    if !bmi.is_finite() {
        return Err(BmiError::NotFinite);
    }
    Ok(bmi)
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct BmiRequest {
    #[schemars(description = "Body weight in kilograms")]
    pub weight_kg: f64,
    #[schemars(description = "Height in metres")]
    pub height_m: f64,
}

#[derive(Clone)]
pub struct Toolbox {
    tool_router: ToolRouter<Self>,
}

impl Default for Toolbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Toolbox {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl Toolbox {
    #[tool(description = "Get the current local system time.")]
    async fn get_time(&self) -> Result<CallToolResult, McpError> {
        let now = current_time();
        log::debug!("toolbox: get_time -> {}", now);
        Ok(CallToolResult::success(vec![Content::text(now)]))
    }

    #[tool(description = "Calculate BMI from body weight (kg) and height (m).")]
    async fn calculate_bmi(
        &self,
        Parameters(req): Parameters<BmiRequest>,
    ) -> Result<CallToolResult, McpError> {
        match calculate_bmi(req.weight_kg, req.height_m) {
            Ok(bmi) => Ok(CallToolResult::success(vec![Content::text(bmi.to_string())])),
            Err(e) => {
                log::warn!("toolbox: calculate_bmi failed: {}", e);
                Ok(CallToolResult::error(vec![Content::text(e.to_string())]))
            }
        }
    }
}

#[tool_handler]
impl ServerHandler for Toolbox {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "toolchat-provider".into(),
                title: Some("toolchat tool provider".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                website_url: None,
            },
            instructions: Some("Provides get_time and calculate_bmi.".into()),
        }
    }
}

/// Serve the toolbox on stdin/stdout until the client disconnects.
pub async fn serve_stdio() -> anyhow::Result<()> {
    let service = serve_server(Toolbox::new(), rmcp::transport::io::stdio()).await?;
    log::info!("toolbox: serving on stdio");
    let reason = service.waiting().await?;
    log::info!("toolbox: stopped ({:?})", reason);
    Ok(())
}

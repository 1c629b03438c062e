//! MCP client for the tool provider process (rmcp over the child's stdin/stdout).

use std::process::Stdio;
use std::sync::RwLock;

use async_trait::async_trait;
use rmcp::model::{CallToolRequestParams, CallToolResult, ClientInfo, ErrorCode, Implementation};
use rmcp::service::RunningService;
use rmcp::transport::child_process::TokioChildProcess;
use rmcp::{serve_client, RoleClient, ServiceError};
use serde_json::{Map, Value};
use tokio::process::Command;

use super::{ToolCallError, ToolDescriptor, ToolProvider, ToolValue};

/// How to start the provider: program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ProviderCommand {
    /// Run `path args...`, or `launcher path args...` when a launcher (e.g. "python") is configured.
    pub fn new(launcher: Option<&str>, path: &str, args: &[String]) -> Self {
        match launcher.map(str::trim).filter(|l| !l.is_empty()) {
            Some(launcher) => {
                let mut all = Vec::with_capacity(args.len() + 1);
                all.push(path.to_string());
                all.extend(args.iter().cloned());
                Self {
                    program: launcher.to_string(),
                    args: all,
                }
            }
            None => Self {
                program: path.to_string(),
                args: args.to_vec(),
            },
        }
    }
}

impl std::fmt::Display for ProviderCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for a in &self.args {
            write!(f, " {}", a)?;
        }
        Ok(())
    }
}

/// Client identity sent in the MCP initialize handshake.
pub fn client_info() -> ClientInfo {
    ClientInfo {
        meta: None,
        protocol_version: Default::default(),
        capabilities: Default::default(),
        client_info: Implementation {
            name: "toolchat".into(),
            title: Some("toolchat orchestrator".into()),
            version: env!("CARGO_PKG_VERSION").into(),
            icons: None,
            website_url: None,
        },
    }
}

/// Tool provider reached over MCP. The session lives until [`McpToolProvider::shutdown`] or drop.
pub struct McpToolProvider {
    service: RunningService<RoleClient, ClientInfo>,
    /// Tool names from the last `list_tools`; empty until tools have been listed.
    known: RwLock<Vec<String>>,
}

impl McpToolProvider {
    /// Spawn the provider process and complete the initialize handshake.
    pub async fn spawn(command: &ProviderCommand) -> Result<Self, ToolCallError> {
        log::debug!("mcp: spawning provider: {}", command);
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        let transport = TokioChildProcess::new(cmd).map_err(|e| {
            ToolCallError::Transport(format!("failed to start provider '{}': {}", command, e))
        })?;
        let service = serve_client(client_info(), transport).await.map_err(|e| {
            ToolCallError::Transport(format!("failed to initialize provider '{}': {}", command, e))
        })?;
        if let Some(info) = service.peer_info() {
            log::info!(
                "mcp: connected to {} {}",
                info.server_info.name,
                info.server_info.version
            );
        }
        Ok(Self::from_service(service))
    }

    /// Wrap an already-initialized client (e.g. one served over an in-memory pipe).
    pub fn from_service(service: RunningService<RoleClient, ClientInfo>) -> Self {
        Self {
            service,
            known: RwLock::new(Vec::new()),
        }
    }

    fn is_known(&self, name: &str) -> bool {
        match self.known.read() {
            Ok(known) => known.is_empty() || known.iter().any(|n| n == name),
            Err(_) => true,
        }
    }

    /// Close the session; the child process is reaped when the transport drops.
    pub async fn shutdown(self) -> Result<(), ToolCallError> {
        self.service
            .cancel()
            .await
            .map(|_| ())
            .map_err(|e| ToolCallError::Transport(e.to_string()))
    }
}

#[async_trait]
impl ToolProvider for McpToolProvider {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolCallError> {
        let tools = self
            .service
            .peer()
            .list_all_tools()
            .await
            .map_err(|e| ToolCallError::Transport(format!("list tools failed: {}", e)))?;
        log::debug!("mcp: listed {} tools", tools.len());
        if let Ok(mut known) = self.known.write() {
            *known = tools.iter().map(|t| t.name.to_string()).collect();
        }
        Ok(tools
            .iter()
            .map(|t| ToolDescriptor::from_schema(&t.name, t.description.as_deref(), &t.input_schema))
            .collect())
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<ToolValue, ToolCallError> {
        if !self.is_known(name) {
            return Err(ToolCallError::NotFound(name.to_string()));
        }
        log::debug!("mcp: calling tool {}", name);
        let result = self
            .service
            .peer()
            .call_tool(CallToolRequestParams {
                meta: None,
                name: name.to_string().into(),
                arguments: Some(arguments),
                task: None,
            })
            .await
            .map_err(|e| error_from_service(name, e))?;
        value_from_result(result)
    }
}

/// Keep the kind of a rejected call: bad arguments are the tool's failure, not the transport's.
fn error_from_service(name: &str, error: ServiceError) -> ToolCallError {
    match error {
        ServiceError::McpError(e)
            if e.code == ErrorCode::METHOD_NOT_FOUND
                || (e.code == ErrorCode::INVALID_PARAMS && e.message.contains("tool not found")) =>
        {
            ToolCallError::NotFound(name.to_string())
        }
        ServiceError::McpError(e) if e.code == ErrorCode::INVALID_PARAMS => {
            ToolCallError::Execution(e.message.to_string())
        }
        other => ToolCallError::Transport(other.to_string()),
    }
}

/// Decode a tool result: `isError` becomes [`ToolCallError::Execution`]; structured content wins over text.
fn value_from_result(result: CallToolResult) -> Result<ToolValue, ToolCallError> {
    let text = result
        .content
        .iter()
        .filter_map(|c| c.as_text().map(|t| t.text.to_string()))
        .collect::<Vec<_>>()
        .join("\n");
    if result.is_error == Some(true) {
        return Err(ToolCallError::Execution(if text.is_empty() {
            "tool reported an error".to_string()
        } else {
            text
        }));
    }
    if let Some(structured) = result.structured_content {
        return Ok(ToolValue::from_json(structured));
    }
    Ok(ToolValue::from_text(&text))
}

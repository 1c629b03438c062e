//! Tool layer: descriptors discovered from the tool provider, invocation results, and the provider seam.
//!
//! The orchestrator talks to tools only through [`ToolProvider`]; [`McpToolProvider`] is the
//! implementation that drives a provider child process over MCP.

pub mod invocation;
mod mcp;

use async_trait::async_trait;
use serde_json::{Map, Value};

pub use invocation::{parse_reply, strip_code_fence, ParsedReply, ToolInvocation};
pub use mcp::{client_info, McpToolProvider, ProviderCommand};

/// One parameter of a tool's input schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema type, when declared (e.g. "number", "string").
    pub kind: Option<String>,
    pub required: bool,
}

/// Metadata describing one callable tool: name, description and argument schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterSpec>,
}

const NO_DESCRIPTION: &str = "No description";

impl ToolDescriptor {
    /// Build a descriptor from a JSON Schema object (`properties`, `required`).
    /// Parameters keep the order in which the schema lists them.
    pub fn from_schema(name: &str, description: Option<&str>, schema: &Map<String, Value>) -> Self {
        let required: Vec<&str> = schema
            .get("required")
            .and_then(|r| r.as_array())
            .map(|r| r.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();
        let parameters = schema
            .get("properties")
            .and_then(|p| p.as_object())
            .map(|props| {
                props
                    .iter()
                    .map(|(param, info)| ParameterSpec {
                        name: param.clone(),
                        description: info
                            .get("description")
                            .and_then(|d| d.as_str())
                            .unwrap_or(NO_DESCRIPTION)
                            .to_string(),
                        kind: info.get("type").and_then(|t| t.as_str()).map(String::from),
                        required: required.contains(&param.as_str()),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            name: name.to_string(),
            description: description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or(NO_DESCRIPTION)
                .to_string(),
            parameters,
        }
    }
}

/// Value returned by a successful tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolValue {
    Text(String),
    Number(f64),
    /// Long-running work reported as `{ "progress": n, "total": m }`.
    Progress { progress: f64, total: f64 },
    Json(Value),
}

impl ToolValue {
    /// Interpret a structured JSON value.
    pub fn from_json(value: Value) -> Self {
        if let Some(n) = value.as_f64() {
            return ToolValue::Number(n);
        }
        if let Value::String(s) = value {
            return ToolValue::Text(s);
        }
        let progress = value.get("progress").and_then(|v| v.as_f64());
        let total = value.get("total").and_then(|v| v.as_f64());
        match (progress, total) {
            (Some(progress), Some(total)) => ToolValue::Progress { progress, total },
            _ => ToolValue::Json(value),
        }
    }

    /// Interpret text content: JSON if it parses as a number or object/array, otherwise the text itself.
    pub fn from_text(text: &str) -> Self {
        match serde_json::from_str::<Value>(text.trim()) {
            Ok(v @ (Value::Number(_) | Value::Object(_) | Value::Array(_))) => Self::from_json(v),
            _ => ToolValue::Text(text.to_string()),
        }
    }

    /// `Progress: p/t (xx.x%)` for progress values.
    pub fn progress_line(&self) -> Option<String> {
        match self {
            ToolValue::Progress { progress, total } => {
                let percentage = if *total == 0.0 {
                    0.0
                } else {
                    progress / total * 100.0
                };
                Some(format!("Progress: {}/{} ({:.1}%)", progress, total, percentage))
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for ToolValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolValue::Text(s) => f.write_str(s),
            ToolValue::Number(n) => write!(f, "{}", n),
            ToolValue::Progress { progress, total } => {
                write!(f, "{{\"progress\": {}, \"total\": {}}}", progress, total)
            }
            ToolValue::Json(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolCallError {
    #[error("tool not found: {0}")]
    NotFound(String),
    /// The tool ran and reported a failure (e.g. invalid arguments, arithmetic fault).
    #[error("{0}")]
    Execution(String),
    /// The provider could not be reached or answered with a protocol error.
    #[error("provider error: {0}")]
    Transport(String),
}

/// A process exposing named tools: enumerate descriptors, call one by name.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolCallError>;

    /// Call a tool. Arguments are passed through unvalidated; the tool checks them.
    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<ToolValue, ToolCallError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn descriptor_from_schema_reads_properties_and_required() {
        let schema = json!({
            "type": "object",
            "properties": {
                "weight_kg": {"type": "number", "description": "Body weight in kilograms"},
                "height_m": {"type": "number"}
            },
            "required": ["weight_kg"]
        });
        let d = ToolDescriptor::from_schema("calculate_bmi", Some("BMI"), schema.as_object().unwrap());
        assert_eq!(d.name, "calculate_bmi");
        assert_eq!(d.parameters.len(), 2);
        assert_eq!(d.parameters[0].name, "weight_kg");
        assert_eq!(d.parameters[0].description, "Body weight in kilograms");
        assert_eq!(d.parameters[0].kind.as_deref(), Some("number"));
        assert!(d.parameters[0].required);
        assert_eq!(d.parameters[1].description, "No description");
        assert!(!d.parameters[1].required);
    }

    #[test]
    fn descriptor_without_properties_has_no_parameters() {
        let schema = json!({"type": "object"});
        let d = ToolDescriptor::from_schema("get_time", None, schema.as_object().unwrap());
        assert!(d.parameters.is_empty());
        assert_eq!(d.description, "No description");
    }

    #[test]
    fn value_from_text_detects_numbers_and_progress() {
        assert_eq!(ToolValue::from_text("22.5"), ToolValue::Number(22.5));
        assert_eq!(
            ToolValue::from_text(r#"{"progress": 3, "total": 4}"#),
            ToolValue::Progress { progress: 3.0, total: 4.0 }
        );
        assert_eq!(
            ToolValue::from_text("2026-10-18 09:30:00.000001"),
            ToolValue::Text("2026-10-18 09:30:00.000001".to_string())
        );
        assert_eq!(
            ToolValue::from_text(r#"{"a": 1}"#),
            ToolValue::Json(json!({"a": 1}))
        );
    }

    #[test]
    fn quoted_json_string_stays_verbatim() {
        assert_eq!(
            ToolValue::from_text("\"hello\""),
            ToolValue::Text("\"hello\"".to_string())
        );
    }

    #[test]
    fn progress_line_formats_percentage() {
        let v = ToolValue::Progress { progress: 1.0, total: 3.0 };
        assert_eq!(v.progress_line().as_deref(), Some("Progress: 1/3 (33.3%)"));
        assert_eq!(ToolValue::Number(1.0).progress_line(), None);
    }

    #[test]
    fn display_renders_literal_values() {
        assert_eq!(ToolValue::Number(22.857142857142858).to_string(), "22.857142857142858");
        assert_eq!(ToolValue::Text("noon".into()).to_string(), "noon");
    }
}

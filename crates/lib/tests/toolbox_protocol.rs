//! Integration test: serve the toolbox over an in-memory pipe and drive it with the MCP tool provider.
//! Exercises the same rmcp code paths as the stdio binary without spawning a process.

use serde_json::{json, Map, Value};
use toolchat::toolbox::Toolbox;
use toolchat::tools::{client_info, McpToolProvider, ToolCallError, ToolProvider, ToolValue};

async fn connect() -> McpToolProvider {
    let (server_io, client_io) = tokio::io::duplex(64 * 1024);
    tokio::spawn(async move {
        if let Ok(service) = rmcp::serve_server(Toolbox::new(), server_io).await {
            let _ = service.waiting().await;
        }
    });
    let service = rmcp::serve_client(client_info(), client_io)
        .await
        .expect("initialize handshake");
    McpToolProvider::from_service(service)
}

fn args(v: Value) -> Map<String, Value> {
    v.as_object().cloned().expect("arguments object")
}

#[tokio::test]
async fn lists_both_tools_with_schemas() {
    let provider = connect().await;
    let tools = provider.list_tools().await.expect("list tools");
    let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
    assert!(names.contains(&"get_time"));
    assert!(names.contains(&"calculate_bmi"));

    let bmi = tools.iter().find(|t| t.name == "calculate_bmi").unwrap();
    let weight = bmi
        .parameters
        .iter()
        .find(|p| p.name == "weight_kg")
        .expect("weight_kg parameter");
    assert!(weight.required);
    assert_eq!(weight.description, "Body weight in kilograms");
    assert!(bmi.parameters.iter().any(|p| p.name == "height_m" && p.required));

    let time = tools.iter().find(|t| t.name == "get_time").unwrap();
    assert!(time.parameters.is_empty());
}

#[tokio::test]
async fn get_time_returns_timestamp_text() {
    let provider = connect().await;
    provider.list_tools().await.unwrap();
    let value = provider.call_tool("get_time", Map::new()).await.unwrap();
    let text = match value {
        ToolValue::Text(text) => text,
        other => panic!("expected text, got {:?}", other),
    };
    assert!(chrono_like(&text), "unexpected time format: {}", text);
}

fn chrono_like(s: &str) -> bool {
    // YYYY-MM-DD HH:MM:SS.ffffff
    s.len() == 26 && s.as_bytes()[4] == b'-' && s.as_bytes()[10] == b' ' && s.as_bytes()[19] == b'.'
}

#[tokio::test]
async fn calculate_bmi_returns_number() {
    let provider = connect().await;
    provider.list_tools().await.unwrap();
    let value = provider
        .call_tool("calculate_bmi", args(json!({"weight_kg": 70, "height_m": 1.75})))
        .await
        .unwrap();
    let bmi = match value {
        ToolValue::Number(bmi) => bmi,
        other => panic!("expected number, got {:?}", other),
    };
    assert!((bmi - 22.857142857142858).abs() < 1e-9);
}

#[tokio::test]
async fn zero_height_is_an_execution_error() {
    let provider = connect().await;
    provider.list_tools().await.unwrap();
    let err = provider
        .call_tool("calculate_bmi", args(json!({"weight_kg": 70, "height_m": 0})))
        .await
        .unwrap_err();
    let message = match err {
        ToolCallError::Execution(message) => message,
        other => panic!("expected execution error, got {:?}", other),
    };
    assert!(message.contains("height_m"));
}

#[tokio::test]
async fn non_numeric_arguments_are_rejected() {
    let provider = connect().await;
    provider.list_tools().await.unwrap();
    let res = provider
        .call_tool("calculate_bmi", args(json!({"weight_kg": "heavy", "height_m": 1.8})))
        .await;
    match res {
        Err(ToolCallError::Execution(message)) => assert!(message.contains("weight_kg") || message.contains("f64")),
        other => panic!("expected execution error, got {:?}", other),
    }
}

#[tokio::test]
async fn missing_argument_is_an_execution_error() {
    let provider = connect().await;
    provider.list_tools().await.unwrap();
    let res = provider
        .call_tool("calculate_bmi", args(json!({"weight_kg": 70})))
        .await;
    match res {
        Err(ToolCallError::Execution(message)) => assert!(message.contains("height_m")),
        other => panic!("expected execution error, got {:?}", other),
    }
}

#[tokio::test]
async fn unlisted_tool_is_not_found() {
    let provider = connect().await;
    provider.list_tools().await.unwrap();
    let err = provider.call_tool("get_weather", Map::new()).await.unwrap_err();
    assert_eq!(err, ToolCallError::NotFound("get_weather".to_string()));
}

#[tokio::test]
async fn shutdown_closes_session() {
    let provider = connect().await;
    provider.list_tools().await.unwrap();
    assert!(provider.shutdown().await.is_ok());
}

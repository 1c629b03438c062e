//! Parse a model reply into either plain text or a typed tool invocation.
//!
//! The model is told to answer with exactly `{"tool": "<name>", "arguments": {...}}` when it wants a tool.
//! Anything that does not validate against that shape is a final answer.

use serde_json::{Map, Value};

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedReply {
    PlainText,
    Invocation(ToolInvocation),
}

/// Remove a surrounding Markdown code fence (```` ```json ```` or ```` ``` ````), if any.
pub fn strip_code_fence(text: &str) -> &str {
    let t = text.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    // Drop the info string ("json") on the opening fence line.
    let rest = match rest.find('\n') {
        Some(i) if rest[..i].trim().chars().all(|c| c.is_ascii_alphanumeric()) => &rest[i + 1..],
        _ => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse then validate: only an object with a string `tool` and an object `arguments` is an invocation.
pub fn parse_reply(text: &str) -> ParsedReply {
    let Ok(Value::Object(mut obj)) = serde_json::from_str::<Value>(strip_code_fence(text)) else {
        return ParsedReply::PlainText;
    };
    let name = match obj.get("tool") {
        Some(Value::String(name)) => name.clone(),
        _ => return ParsedReply::PlainText,
    };
    match obj.remove("arguments") {
        Some(Value::Object(arguments)) => ParsedReply::Invocation(ToolInvocation { name, arguments }),
        _ => ParsedReply::PlainText,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_json_is_plain_text() {
        assert_eq!(parse_reply("It is sunny today."), ParsedReply::PlainText);
        assert_eq!(parse_reply("{not json"), ParsedReply::PlainText);
        assert_eq!(parse_reply(""), ParsedReply::PlainText);
    }

    #[test]
    fn json_without_both_keys_is_plain_text() {
        assert_eq!(parse_reply(r#"{"tool": "get_time"}"#), ParsedReply::PlainText);
        assert_eq!(parse_reply(r#"{"arguments": {}}"#), ParsedReply::PlainText);
        assert_eq!(parse_reply(r#"[1, 2]"#), ParsedReply::PlainText);
        assert_eq!(parse_reply("42"), ParsedReply::PlainText);
    }

    #[test]
    fn wrongly_typed_keys_are_plain_text() {
        assert_eq!(parse_reply(r#"{"tool": 7, "arguments": {}}"#), ParsedReply::PlainText);
        assert_eq!(
            parse_reply(r#"{"tool": "get_time", "arguments": "none"}"#),
            ParsedReply::PlainText
        );
    }

    #[test]
    fn valid_invocation_is_parsed() {
        let parsed = parse_reply(r#"{"tool": "calculate_bmi", "arguments": {"weight_kg": 70, "height_m": 1.75}}"#);
        let ParsedReply::Invocation(inv) = parsed else {
            panic!("expected invocation");
        };
        assert_eq!(inv.name, "calculate_bmi");
        assert_eq!(inv.arguments.get("weight_kg"), Some(&json!(70)));
        assert_eq!(inv.arguments.get("height_m"), Some(&json!(1.75)));
    }

    #[test]
    fn fenced_invocation_is_parsed() {
        let reply = "```json\n{\"tool\": \"get_time\", \"arguments\": {}}\n```";
        assert_eq!(
            parse_reply(reply),
            ParsedReply::Invocation(ToolInvocation {
                name: "get_time".to_string(),
                arguments: Map::new(),
            })
        );
    }

    #[test]
    fn strip_code_fence_variants() {
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  plain  "), "plain");
        assert_eq!(strip_code_fence("```{}```"), "{}");
    }
}

//! OpenAI-compatible chat completions client (`POST {base}/chat/completions`, non-streaming).
//!
//! Works with any server that speaks the OpenAI chat API (OpenAI, LM Studio, vLLM, DeepSeek, ...).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{CompletionBackend, LlmError};
use crate::config::{LlmSettings, DEFAULT_BASE_URL};
use crate::transcript::{Role, TranscriptEntry};

/// Client for an OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(base_url: Option<String>, api_key: Option<String>) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_settings(settings: &LlmSettings) -> Self {
        Self::new(Some(settings.base_url.clone()), settings.api_key.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST /chat/completions — non-streaming chat. Returns the first choice's message content.
    pub async fn chat(&self, model: &str, entries: &[TranscriptEntry]) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = OpenAiChatRequest {
            model: model.to_string(),
            messages: entries_to_openai(entries),
            stream: false,
        };
        log::debug!("llm: POST {} ({} messages)", url, body.messages.len());
        let mut req = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let res = req.send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("{} {}", status, body)));
        }
        let data: OpenAiChatResponse = res.json().await?;
        openai_response_to_text(data)
    }
}

#[async_trait]
impl CompletionBackend for OpenAiClient {
    async fn complete(&self, model: &str, entries: &[TranscriptEntry]) -> Result<String, LlmError> {
        self.chat(model, entries).await
    }
}

// --- OpenAI wire types ---

#[derive(Debug, Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    stream: bool,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "role", rename_all = "snake_case")]
enum OpenAiMessage {
    System { content: String },
    User { content: String },
    Assistant { content: String },
}

fn entries_to_openai(entries: &[TranscriptEntry]) -> Vec<OpenAiMessage> {
    entries
        .iter()
        .map(|e| {
            let content = e.content.clone();
            match e.role {
                Role::System => OpenAiMessage::System { content },
                Role::User => OpenAiMessage::User { content },
                Role::Assistant => OpenAiMessage::Assistant { content },
            }
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    choices: Option<Vec<OpenAiChoice>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: Option<OpenAiResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

fn openai_response_to_text(data: OpenAiChatResponse) -> Result<String, LlmError> {
    let choice = data
        .choices
        .and_then(|c| c.into_iter().next())
        .ok_or(LlmError::EmptyResponse)?;
    Ok(choice
        .message
        .and_then(|m| m.content)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_trims_trailing_slash_and_defaults() {
        assert_eq!(
            OpenAiClient::new(Some("http://localhost:1234/v1/".into()), None).base_url(),
            "http://localhost:1234/v1"
        );
        assert_eq!(OpenAiClient::new(None, None).base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn entries_serialize_with_role_tags() {
        let entries = vec![
            TranscriptEntry::system("s"),
            TranscriptEntry::user("u"),
            TranscriptEntry::assistant("a"),
        ];
        let v = serde_json::to_value(entries_to_openai(&entries)).unwrap();
        assert_eq!(
            v,
            json!([
                {"role": "system", "content": "s"},
                {"role": "user", "content": "u"},
                {"role": "assistant", "content": "a"}
            ])
        );
    }

    #[test]
    fn response_takes_first_choice_content() {
        let data: OpenAiChatResponse = serde_json::from_value(json!({
            "choices": [
                {"message": {"role": "assistant", "content": "first"}},
                {"message": {"role": "assistant", "content": "second"}}
            ]
        }))
        .unwrap();
        assert_eq!(openai_response_to_text(data).unwrap(), "first");
    }

    #[test]
    fn response_with_null_content_is_empty_text() {
        let data: OpenAiChatResponse =
            serde_json::from_value(json!({"choices": [{"message": {"content": null}}]})).unwrap();
        assert_eq!(openai_response_to_text(data).unwrap(), "");
    }

    #[test]
    fn response_without_choices_is_error() {
        let data: OpenAiChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(
            openai_response_to_text(data),
            Err(LlmError::EmptyResponse)
        ));
    }
}

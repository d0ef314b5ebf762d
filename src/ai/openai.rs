use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{AppError, Result};

use super::CompletionBackend;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenAI chat-completions client, built once at startup.
pub struct OpenAiBackend {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiBackend {
    pub fn new(api_key: String, model: String, base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let endpoint = format!("{}/chat/completions", base_url.trim_end_matches('/'));
        Ok(Self {
            client,
            api_key,
            model,
            endpoint,
        })
    }

    /// Fails with a configuration error when no API key is configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        Self::new(
            api_key,
            config.openai_model.clone(),
            &config.openai_base_url,
            Duration::from_secs(config.llm_timeout_secs),
        )
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete_json(&self, system: &str, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(AppError::Upstream(format!("API error ({}): {}", status, error_text)));
        }

        let chat_response: ChatResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AppError::Upstream("No response from model".to_string()))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_asks_for_json_mode() {
        let request = ChatRequest {
            model: "gpt-4o".to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: "hi".to_string(),
            }],
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        };

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["role"], "user");
        assert!(body.get("stream").is_none());
    }

    #[test]
    fn response_content_is_read_from_first_choice() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"{\"summary\":\"s\"}"}}]}"#,
        )
        .unwrap();
        assert_eq!(
            response.choices[0].message.content.as_deref(),
            Some(r#"{"summary":"s"}"#)
        );
    }

    #[test]
    fn missing_api_key_fails_at_construction() {
        let config = Config {
            openai_api_key: None,
            ..Config::default()
        };
        assert!(matches!(
            OpenAiBackend::from_config(&config),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn endpoint_is_derived_from_base_url() {
        let backend = OpenAiBackend::new(
            "sk".into(),
            "gpt-4o".into(),
            "http://localhost:8080/v1/",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(backend.endpoint, "http://localhost:8080/v1/chat/completions");
        assert_eq!(backend.model(), "gpt-4o");
    }
}

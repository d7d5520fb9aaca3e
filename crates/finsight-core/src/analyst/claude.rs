use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{parse_response, Analyst, AnalystResponse, ConversationTurn};
use crate::error::AnalystError;
use crate::state::ChatRole;

#[derive(Serialize)]
struct ClaudeMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<ClaudeMessage>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Clone)]
pub struct ClaudeClient {
    client: Client,
    api_key: String,
    model: String,
    system_instruction: String,
}

impl ClaudeClient {
    pub fn new(api_key: &str, model: &str, system_instruction: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            system_instruction: system_instruction.to_string(),
        }
    }

    fn build_request(&self, history: &[ConversationTurn], question: &str) -> ClaudeRequest {
        let mut messages: Vec<ClaudeMessage> = history
            .iter()
            .map(|turn| ClaudeMessage {
                role: match turn.role {
                    ChatRole::User => "user",
                    ChatRole::Assistant => "assistant",
                }
                .to_string(),
                content: turn.text.clone(),
            })
            .collect();

        messages.push(ClaudeMessage {
            role: "user".to_string(),
            content: question.to_string(),
        });

        ClaudeRequest {
            model: self.model.clone(),
            max_tokens: 4096,
            system: self.system_instruction.clone(),
            messages,
        }
    }
}

#[async_trait]
impl Analyst for ClaudeClient {
    async fn ask(
        &self,
        history: &[ConversationTurn],
        question: &str,
    ) -> Result<AnalystResponse, AnalystError> {
        let request = self.build_request(history, question);

        let response = self.client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnalystError::Status {
                provider: "Claude",
                status,
                body,
            });
        }

        let claude_response: ClaudeResponse = response.json().await?;
        let text = claude_response
            .content
            .into_iter()
            .map(|c| c.text)
            .find(|t| !t.trim().is_empty())
            .ok_or(AnalystError::EmptyResponse("Claude"))?;

        parse_response(&text)
    }

    fn describe(&self) -> String {
        format!("Claude: {}", self.model)
    }
}

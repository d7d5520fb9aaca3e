use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{parse_response, Analyst, AnalystResponse, ConversationTurn};
use crate::error::AnalystError;
use crate::state::ChatRole;

#[derive(Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    response_format: ResponseFormat,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    model: String,
    system_instruction: String,
}

impl OpenAIClient {
    pub fn new(api_key: &str, model: &str, system_instruction: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            system_instruction: system_instruction.to_string(),
        }
    }

    fn build_request(&self, history: &[ConversationTurn], question: &str) -> OpenAIRequest {
        let mut messages = vec![OpenAIMessage {
            role: "system".to_string(),
            content: self.system_instruction.clone(),
        }];

        for turn in history {
            messages.push(OpenAIMessage {
                role: match turn.role {
                    ChatRole::User => "user",
                    ChatRole::Assistant => "assistant",
                }
                .to_string(),
                content: turn.text.clone(),
            });
        }

        messages.push(OpenAIMessage {
            role: "user".to_string(),
            content: question.to_string(),
        });

        OpenAIRequest {
            model: self.model.clone(),
            messages,
            response_format: ResponseFormat {
                kind: "json_object".to_string(),
            },
        }
    }
}

#[async_trait]
impl Analyst for OpenAIClient {
    async fn ask(
        &self,
        history: &[ConversationTurn],
        question: &str,
    ) -> Result<AnalystResponse, AnalystError> {
        let request = self.build_request(history, question);

        let response = self.client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnalystError::Status {
                provider: "OpenAI",
                status,
                body,
            });
        }

        let openai_response: OpenAIResponse = response.json().await?;
        let text = openai_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(AnalystError::EmptyResponse("OpenAI"))?;

        parse_response(&text)
    }

    fn describe(&self) -> String {
        format!("OpenAI: {}", self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_leads_with_system_message() {
        let client = OpenAIClient::new("key", "gpt-4o-mini", "SYSTEM");
        let history = vec![ConversationTurn {
            role: ChatRole::Assistant,
            text: "earlier answer".to_string(),
        }];

        let body = serde_json::to_value(client.build_request(&history, "why?")).unwrap();

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], "SYSTEM");
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[2]["role"], "user");
        assert_eq!(messages[2]["content"], "why?");
        assert_eq!(body["response_format"]["type"], "json_object");
    }
}

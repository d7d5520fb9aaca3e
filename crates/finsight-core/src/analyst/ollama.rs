use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{parse_response, Analyst, AnalystResponse, ConversationTurn};
use crate::error::AnalystError;
use crate::state::ChatRole;

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    system: String,
    prompt: String,
    stream: bool,
    format: String,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    system_instruction: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str, system_instruction: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            system_instruction: system_instruction.to_string(),
        }
    }
}

/// `/api/generate` takes a single prompt, so prior turns become a transcript
fn build_prompt(history: &[ConversationTurn], question: &str) -> String {
    let mut prompt = String::new();

    if !history.is_empty() {
        prompt.push_str("Conversation so far:\n");
        for turn in history {
            match turn.role {
                ChatRole::User => prompt.push_str(&format!("User: {}\n", turn.text)),
                ChatRole::Assistant => prompt.push_str(&format!("Assistant: {}\n", turn.text)),
            }
        }
        prompt.push('\n');
    }

    prompt.push_str("Current question: ");
    prompt.push_str(question);

    prompt
}

#[async_trait]
impl Analyst for OllamaClient {
    async fn ask(
        &self,
        history: &[ConversationTurn],
        question: &str,
    ) -> Result<AnalystResponse, AnalystError> {
        let url = format!("{}/api/generate", self.base_url);

        let request = OllamaRequest {
            model: self.model.clone(),
            system: self.system_instruction.clone(),
            prompt: build_prompt(history, question),
            stream: false,
            format: "json".to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnalystError::Status {
                provider: "Ollama",
                status,
                body,
            });
        }

        let ollama_response: OllamaResponse = response.json().await?;
        parse_response(&ollama_response.response)
    }

    fn describe(&self) -> String {
        format!("Ollama: {}", self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_without_history_is_just_the_question() {
        assert_eq!(build_prompt(&[], "Q?"), "Current question: Q?");
    }

    #[test]
    fn test_prompt_folds_history_into_transcript() {
        let history = vec![
            ConversationTurn {
                role: ChatRole::User,
                text: "total revenue?".to_string(),
            },
            ConversationTurn {
                role: ChatRole::Assistant,
                text: "5,250,000".to_string(),
            },
        ];
        let prompt = build_prompt(&history, "and Q4?");
        assert!(prompt.starts_with("Conversation so far:\nUser: total revenue?\nAssistant: 5,250,000\n"));
        assert!(prompt.ends_with("Current question: and Q4?"));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = OllamaClient::new("http://localhost:11434/", "llama3.2:latest", "S");
        assert_eq!(client.base_url, "http://localhost:11434");
    }
}

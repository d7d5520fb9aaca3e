//! Remote analyst clients
//!
//! Each provider turns the system instruction, the prior conversation and the
//! new question into one HTTP request and hands the raw model text to
//! [`parse_response`]. Anything that does not parse into an
//! [`AnalystResponse`] is an error; no partial answer is ever produced.

pub mod claude;
pub mod gemini;
pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Settings;
use crate::error::AnalystError;
use crate::provider::Provider;
use crate::state::ChatRole;

pub use claude::ClaudeClient;
pub use gemini::GeminiClient;
pub use ollama::OllamaClient;
pub use openai::OpenAIClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Bar,
    Line,
    Area,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Area => "area",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataPoint {
    pub name: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Chart attached to an assistant message
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub chart_type: ChartType,
    pub title: Option<String>,
    pub data: Vec<ChartDataPoint>,
}

/// The JSON object the model is instructed to return
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalystResponse {
    pub answer: String,
    #[serde(default)]
    pub show_chart: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<ChartType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_data: Option<Vec<ChartDataPoint>>,
}

impl AnalystResponse {
    pub fn text(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            show_chart: false,
            chart_type: None,
            chart_title: None,
            chart_data: None,
        }
    }

    /// The chart to show, if the model asked for one and supplied data points
    pub fn into_chart(self) -> (String, Option<ChartSpec>) {
        let chart = match (self.show_chart, self.chart_data) {
            (true, Some(data)) => Some(ChartSpec {
                chart_type: self.chart_type.unwrap_or_default(),
                title: self.chart_title,
                data,
            }),
            _ => None,
        };
        (self.answer, chart)
    }
}

/// One prior message, as context for the next request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub role: ChatRole,
    pub text: String,
}

#[async_trait]
pub trait Analyst: Send + Sync {
    async fn ask(
        &self,
        history: &[ConversationTurn],
        question: &str,
    ) -> Result<AnalystResponse, AnalystError>;

    /// Label for the header, e.g. "Gemini: gemini-2.5-flash"
    fn describe(&self) -> String;
}

/// Build the client for the configured provider
pub fn connect(settings: &Settings, system_instruction: &str) -> Arc<dyn Analyst> {
    let key = settings.api_key.clone().unwrap_or_default();
    let model = settings.model.as_str();

    match settings.provider {
        Provider::Gemini => Arc::new(GeminiClient::new(&key, model, system_instruction)),
        Provider::OpenAI => Arc::new(OpenAIClient::new(&key, model, system_instruction)),
        Provider::Claude => Arc::new(ClaudeClient::new(&key, model, system_instruction)),
        Provider::Ollama => Arc::new(OllamaClient::new(&settings.ollama_url, model, system_instruction)),
    }
}

/// Parse raw model output into a typed response.
///
/// A single Markdown code fence around the whole payload is stripped; any
/// other deviation from the schema is an error.
pub fn parse_response(raw: &str) -> Result<AnalystResponse, AnalystError> {
    let payload = strip_code_fence(raw.trim());
    let response: AnalystResponse = serde_json::from_str(payload)?;
    Ok(response)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening line
    match body.split_once('\n') {
        Some((info, inner)) if !info.contains('{') => inner.trim(),
        _ => body.trim(),
    }
}

//! UI-agnostic conversation state
//!
//! The message log and the loading indicator. Nothing here knows about
//! terminals or HTTP; the session controller drives every transition.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::analyst::{AnalystResponse, ChartSpec, ConversationTurn};
use crate::error::AnalystError;

pub const WELCOME_MESSAGE: &str = "Hello! I'm FinSight, your AI financial analyst. I've analyzed the 2023 fiscal reports. How can I help you today?";
pub const RESET_MESSAGE: &str = "Session reset. I'm ready for new questions regarding the 2023 financial data.";
pub const APOLOGY_MESSAGE: &str = "I apologize, but I encountered an error processing your request. Please try again.";

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    User { text: String },
    Assistant { text: String, chart: Option<ChartSpec> },
}

/// A chat message. Never changed after it is appended.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub timestamp: DateTime<Local>,
    pub body: MessageBody,
}

impl Message {
    pub fn role(&self) -> ChatRole {
        match self.body {
            MessageBody::User { .. } => ChatRole::User,
            MessageBody::Assistant { .. } => ChatRole::Assistant,
        }
    }

    pub fn content(&self) -> &str {
        match &self.body {
            MessageBody::User { text } | MessageBody::Assistant { text, .. } => text,
        }
    }

    pub fn chart(&self) -> Option<&ChartSpec> {
        match &self.body {
            MessageBody::Assistant { chart, .. } => chart.as_ref(),
            MessageBody::User { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadingState {
    #[default]
    Idle,
    Loading,
}

/// Question accepted by [`Conversation::begin_request`], ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub history: Vec<ConversationTurn>,
    pub question: String,
}

#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    loading: LoadingState,
    next_id: u64,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        let mut conversation = Self {
            messages: Vec::new(),
            loading: LoadingState::Idle,
            next_id: 0,
        };
        conversation.push_assistant(WELCOME_MESSAGE.to_string(), None);
        conversation
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn loading(&self) -> LoadingState {
        self.loading
    }

    pub fn is_loading(&self) -> bool {
        self.loading == LoadingState::Loading
    }

    /// Prior turns to send as context. Leading assistant messages (the
    /// welcome or reset banner) are skipped so the context opens with a user turn.
    pub fn context(&self) -> Vec<ConversationTurn> {
        self.messages
            .iter()
            .skip_while(|m| m.role() == ChatRole::Assistant)
            .map(|m| ConversationTurn {
                role: m.role(),
                text: m.content().to_string(),
            })
            .collect()
    }

    /// Accept a question: append it and enter `Loading`.
    ///
    /// Returns `None` (and changes nothing) for blank input or while a
    /// request is already in flight.
    pub fn begin_request(&mut self, text: &str) -> Option<PendingRequest> {
        let question = text.trim();
        if question.is_empty() || self.is_loading() {
            return None;
        }

        let history = self.context();
        let id = self.allocate_id();
        self.messages.push(Message {
            id,
            timestamp: Local::now(),
            body: MessageBody::User {
                text: question.to_string(),
            },
        });
        self.loading = LoadingState::Loading;

        Some(PendingRequest {
            history,
            question: question.to_string(),
        })
    }

    /// Settle the in-flight request. Always returns to `Idle`.
    ///
    /// Returns `false` when nothing was in flight; the outcome is then dropped
    /// so every assistant reply stays paired with one question.
    pub fn finish_request(&mut self, outcome: Result<AnalystResponse, AnalystError>) -> bool {
        if !self.is_loading() {
            return false;
        }

        match outcome {
            Ok(response) => {
                let (answer, chart) = response.into_chart();
                self.push_assistant(answer, chart);
            }
            Err(_) => self.push_assistant(APOLOGY_MESSAGE.to_string(), None),
        }
        self.loading = LoadingState::Idle;
        true
    }

    /// Replace the log with a single fresh assistant message. Refused while loading.
    pub fn reset(&mut self) -> bool {
        if self.is_loading() {
            return false;
        }
        self.messages.clear();
        self.push_assistant(RESET_MESSAGE.to_string(), None);
        true
    }

    fn push_assistant(&mut self, text: String, chart: Option<ChartSpec>) {
        let id = self.allocate_id();
        self.messages.push(Message {
            id,
            timestamp: Local::now(),
            body: MessageBody::Assistant { text, chart },
        });
    }

    fn allocate_id(&mut self) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyst::{ChartDataPoint, ChartType};

    #[test]
    fn test_starts_with_single_welcome() {
        let conversation = Conversation::new();
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].role(), ChatRole::Assistant);
        assert_eq!(conversation.messages()[0].content(), WELCOME_MESSAGE);
        assert_eq!(conversation.loading(), LoadingState::Idle);
    }

    #[test]
    fn test_begin_request_appends_trimmed_question() {
        let mut conversation = Conversation::new();
        let pending = conversation.begin_request("  total revenue?  ").unwrap();

        assert_eq!(pending.question, "total revenue?");
        assert!(pending.history.is_empty());
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.messages()[1].role(), ChatRole::User);
        assert_eq!(conversation.messages()[1].content(), "total revenue?");
        assert!(conversation.is_loading());
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let mut conversation = Conversation::new();
        assert!(conversation.begin_request("").is_none());
        assert!(conversation.begin_request(" \t\n ").is_none());
        assert_eq!(conversation.len(), 1);
        assert!(!conversation.is_loading());
    }

    #[test]
    fn test_second_request_while_loading_is_ignored() {
        let mut conversation = Conversation::new();
        conversation.begin_request("first").unwrap();
        assert!(conversation.begin_request("second").is_none());
        assert_eq!(conversation.len(), 2);
    }

    #[test]
    fn test_failure_appends_apology_without_chart() {
        let mut conversation = Conversation::new();
        conversation.begin_request("q").unwrap();
        let err = AnalystError::EmptyResponse("Gemini");

        assert!(conversation.finish_request(Err(err)));

        let last = conversation.messages().last().unwrap();
        assert_eq!(last.content(), APOLOGY_MESSAGE);
        assert!(last.chart().is_none());
        assert!(!conversation.is_loading());
    }

    #[test]
    fn test_finish_without_request_is_dropped() {
        let mut conversation = Conversation::new();
        assert!(!conversation.finish_request(Ok(AnalystResponse::text("stray"))));
        assert_eq!(conversation.len(), 1);
    }

    #[test]
    fn test_chart_fields_carried_unchanged() {
        let mut conversation = Conversation::new();
        conversation.begin_request("chart please").unwrap();
        let response = AnalystResponse {
            answer: "Y".to_string(),
            show_chart: true,
            chart_type: Some(ChartType::Line),
            chart_title: Some("T".to_string()),
            chart_data: Some(vec![ChartDataPoint {
                name: "Q1 2023".to_string(),
                value: 1_200_000.0,
                category: None,
            }]),
        };

        conversation.finish_request(Ok(response));

        let last = conversation.messages().last().unwrap();
        assert_eq!(last.content(), "Y");
        let chart = last.chart().unwrap();
        assert_eq!(chart.chart_type, ChartType::Line);
        assert_eq!(chart.title.as_deref(), Some("T"));
        assert_eq!(chart.data[0].name, "Q1 2023");
        assert_eq!(chart.data[0].value, 1_200_000.0);
    }

    #[test]
    fn test_context_skips_leading_banner() {
        let mut conversation = Conversation::new();
        conversation.begin_request("one").unwrap();
        conversation.finish_request(Ok(AnalystResponse::text("answer one")));
        let pending = conversation.begin_request("two").unwrap();

        assert_eq!(
            pending.history,
            vec![
                ConversationTurn {
                    role: ChatRole::User,
                    text: "one".to_string()
                },
                ConversationTurn {
                    role: ChatRole::Assistant,
                    text: "answer one".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut conversation = Conversation::new();
        conversation.begin_request("q").unwrap();
        conversation.finish_request(Ok(AnalystResponse::text("a")));

        assert!(conversation.reset());
        let first: Vec<String> = conversation.messages().iter().map(|m| m.content().to_string()).collect();
        assert!(conversation.reset());
        let second: Vec<String> = conversation.messages().iter().map(|m| m.content().to_string()).collect();

        assert_eq!(first, vec![RESET_MESSAGE.to_string()]);
        assert_eq!(first, second);
        assert_eq!(conversation.messages()[0].role(), ChatRole::Assistant);
    }

    #[test]
    fn test_reset_refused_while_loading() {
        let mut conversation = Conversation::new();
        conversation.begin_request("q").unwrap();
        assert!(!conversation.reset());
        assert_eq!(conversation.len(), 2);
        assert!(conversation.is_loading());
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut conversation = Conversation::new();
        let welcome_id = conversation.messages()[0].id;
        conversation.reset();
        assert!(conversation.messages()[0].id > welcome_id);
    }
}

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::analyst::{Analyst, AnalystResponse};
use crate::error::AnalystError;
use crate::state::Conversation;

/// A user action coming from the view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Submit(String),
    Reset,
}

/// Owns the conversation and mediates every transition.
///
/// At most one analyst request runs at a time; it is spawned on the tokio
/// runtime and cannot be cancelled once started.
pub struct Session {
    conversation: Conversation,
    analyst: Arc<dyn Analyst>,
    in_flight: Option<JoinHandle<Result<AnalystResponse, AnalystError>>>,
}

impl Session {
    pub fn new(analyst: Arc<dyn Analyst>) -> Self {
        Self {
            conversation: Conversation::new(),
            analyst,
            in_flight: None,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn analyst_label(&self) -> String {
        self.analyst.describe()
    }

    /// Apply an intent. Returns whether it was accepted.
    pub fn handle(&mut self, intent: Intent) -> bool {
        match intent {
            Intent::Submit(text) => self.submit(&text),
            Intent::Reset => {
                let accepted = self.conversation.reset();
                if accepted {
                    log::info!("Session reset");
                }
                accepted
            }
        }
    }

    fn submit(&mut self, text: &str) -> bool {
        let Some(pending) = self.conversation.begin_request(text) else {
            log::debug!("Submission ignored (blank input or request in flight)");
            return false;
        };

        log::info!(
            "Asking {} ({} prior turns)",
            self.analyst.describe(),
            pending.history.len()
        );

        let analyst = Arc::clone(&self.analyst);
        self.in_flight = Some(tokio::spawn(async move {
            analyst.ask(&pending.history, &pending.question).await
        }));
        true
    }

    /// Wait for the in-flight request and record its outcome.
    ///
    /// Never completes when nothing is in flight, so it can sit in a
    /// `tokio::select!` next to terminal events. Cancel-safe: dropping it
    /// before the request finishes leaves the request running.
    pub async fn settled(&mut self) {
        let Some(handle) = self.in_flight.as_mut() else {
            return std::future::pending().await;
        };

        let joined = handle.await;
        self.in_flight = None;

        let outcome = joined.unwrap_or_else(|e| Err(AnalystError::Task(e.to_string())));
        match &outcome {
            Ok(response) => log::info!("Analyst answered (chart: {})", response.show_chart),
            Err(e) => log::warn!("Analyst request failed: {}", e),
        }

        self.conversation.finish_request(outcome);
    }

    /// Submit and wait for the answer in one go
    pub async fn submit_and_wait(&mut self, text: &str) -> bool {
        if !self.submit(text) {
            return false;
        }
        self.settled().await;
        true
    }
}

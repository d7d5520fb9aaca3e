pub mod analyst;
pub mod config;
pub mod dataset;
pub mod error;
pub mod prompt;
pub mod provider;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use analyst::{
    connect, Analyst, AnalystResponse, ChartDataPoint, ChartSpec, ChartType, ClaudeClient,
    ConversationTurn, GeminiClient, OllamaClient, OpenAIClient,
};
pub use config::{Config, Overrides, Settings};
pub use dataset::{Dataset, FinancialMetric, PREDEFINED_QUERIES};
pub use error::{AnalystError, ConfigError};
pub use prompt::{response_schema, system_instruction};
pub use provider::Provider;
pub use session::{Intent, Session};
pub use state::{
    ChatRole, Conversation, LoadingState, Message, MessageBody, MessageId, APOLOGY_MESSAGE,
    RESET_MESSAGE, WELCOME_MESSAGE,
};

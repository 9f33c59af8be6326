//! A Gemini-backed research assistant.
//!
//! The crate wires together:
//! - A language model abstraction (`LanguageModel`) with a Gemini client.
//! - Prompt templates and chains that bind them to a model.
//! - A simple tool interface (`Tool` and `ToolRegistry`) with Search and Summarize adapters.
//! - A ReAct `Agent` that loops between the model and tools until it has an answer.
//! - An axum HTTP surface exposing the agent at `POST /research`.

mod agent;
mod chain;
mod config;
mod error;
mod llm;
mod prompt;
#[cfg(feature = "server")]
mod server;
mod telemetry;
mod tool;
pub mod tools;

pub use agent::{parse_step, Agent, AgentRunner, AgentStep};
pub use chain::LlmChain;
pub use config::{
    AgentConfig, AppConfig, LogFormat, ModelConfig, ServerConfig, TelemetryConfig, API_KEY_VAR,
    CONFIG_PATH_VAR,
};
pub use error::{ResearchError, Result};
pub use llm::{GeminiClient, LanguageModel, StubModel};
pub use prompt::{search_prompt, summarize_prompt, PromptTemplate};
#[cfg(feature = "server")]
pub use server::{
    router, serve, AppState, ErrorResponse, QueryRequest, QueryResponse, RootResponse,
    ROOT_MESSAGE,
};
pub use telemetry::init_tracing;
pub use tool::{Tool, ToolDescription, ToolRegistry};
pub use tools::{research_toolkit, SearchTool, SummarizeTool};

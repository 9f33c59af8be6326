//! Tools module - the adapters the research agent can call.
//!
//! - Search: asks the model to act as a search engine
//! - Summarize: condenses text with the model

pub mod search;
pub mod summarize;

use std::sync::Arc;

pub use search::SearchTool;
pub use summarize::SummarizeTool;

use crate::llm::LanguageModel;
use crate::tool::ToolRegistry;

/// The fixed, ordered tool list handed to the agent: Search, then Summarize.
pub fn research_toolkit(model: Arc<dyn LanguageModel>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(SearchTool::new(Arc::clone(&model)));
    registry.register(SummarizeTool::new(model));
    registry
}

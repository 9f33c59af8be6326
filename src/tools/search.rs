//! Model-simulated web search.
//!
//! No retrieval happens here: the model is prompted to answer as if it were a
//! search engine, so results are only as current as the model itself.

use std::sync::Arc;

use async_trait::async_trait;

use crate::chain::LlmChain;
use crate::error::Result;
use crate::llm::LanguageModel;
use crate::prompt::search_prompt;
use crate::tool::Tool;

pub struct SearchTool {
    chain: LlmChain,
}

impl SearchTool {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            chain: LlmChain::new(model, search_prompt()),
        }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "Search"
    }

    fn description(&self) -> &str {
        "Useful for searching information on the internet"
    }

    async fn call(&self, input: &str) -> Result<String> {
        tracing::debug!(query = input, "simulated search");
        self.chain.run(input).await
    }
}

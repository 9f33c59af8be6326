use std::sync::Arc;

use async_trait::async_trait;

use crate::chain::LlmChain;
use crate::error::Result;
use crate::llm::LanguageModel;
use crate::prompt::summarize_prompt;
use crate::tool::Tool;

pub struct SummarizeTool {
    chain: LlmChain,
}

impl SummarizeTool {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            chain: LlmChain::new(model, summarize_prompt()),
        }
    }
}

#[async_trait]
impl Tool for SummarizeTool {
    fn name(&self) -> &str {
        "Summarize"
    }

    fn description(&self) -> &str {
        "Useful for summarizing long texts"
    }

    async fn call(&self, input: &str) -> Result<String> {
        tracing::debug!(chars = input.len(), "summarizing");
        self.chain.run(input).await
    }
}

use std::sync::Arc;

use crate::error::Result;
use crate::llm::LanguageModel;
use crate::prompt::PromptTemplate;

/// A prompt template bound to a model: format, then complete.
#[derive(Clone)]
pub struct LlmChain {
    model: Arc<dyn LanguageModel>,
    prompt: PromptTemplate,
}

impl LlmChain {
    pub fn new(model: Arc<dyn LanguageModel>, prompt: PromptTemplate) -> Self {
        Self { model, prompt }
    }

    /// Runs a single-variable chain with `input` bound to that variable.
    pub async fn run(&self, input: &str) -> Result<String> {
        let rendered = self.prompt.format_single(input)?;
        self.model.complete(&rendered).await
    }
}

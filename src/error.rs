use thiserror::Error;

pub type Result<T> = std::result::Result<T, ResearchError>;

#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("{0}")]
    Config(String),

    #[error("language model error: {0}")]
    LanguageModel(String),

    #[error("prompt template error: {0}")]
    Template(String),

    #[error("could not parse agent output: `{0}`")]
    Parse(String),

    #[error("agent stopped after {0} steps without a final answer")]
    StepLimit(usize),

    #[error("tool `{0}` not found")]
    ToolNotFound(String),

    #[error("tool `{name}` invocation failed: {source}")]
    ToolInvocation {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

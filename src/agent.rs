use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;

use crate::error::{ResearchError, Result};
use crate::llm::LanguageModel;
use crate::prompt::PromptTemplate;
use crate::tool::ToolRegistry;

const FINAL_ANSWER: &str = "Final Answer:";
const STOP_SEQUENCES: [&str; 2] = ["\nObservation:", "\n\tObservation:"];

const PREFIX: &str =
    "Answer the following questions as best you can. You have access to the following tools:";

const FORMAT_INSTRUCTIONS: &str = "Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question";

const SUFFIX: &str = "Begin!

Question: {input}
Thought:{agent_scratchpad}";

fn action_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)")
            .unwrap()
    })
}

/// One parsed model turn.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentStep {
    Action {
        tool: String,
        input: String,
        log: String,
    },
    Finish {
        answer: String,
        log: String,
    },
}

/// Anything that can turn a user query into a final answer.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    async fn run(&self, query: &str) -> Result<String>;
}

/// Zero-shot ReAct agent: think, act, observe, repeat until a final answer
/// or the step budget runs out.
///
/// `run` takes `&self` and keeps its scratchpad on the stack, so a single
/// agent can serve concurrent queries.
pub struct Agent<M: LanguageModel + ?Sized> {
    model: Arc<M>,
    tools: ToolRegistry,
    prompt: PromptTemplate,
    max_steps: usize,
}

impl<M: LanguageModel + ?Sized> Agent<M> {
    pub fn new(model: Arc<M>, tools: ToolRegistry) -> Self {
        let prompt = react_prompt(&tools);
        Self {
            model,
            tools,
            prompt,
            max_steps: 15,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    fn build_prompt(&self, query: &str, scratchpad: &str) -> Result<String> {
        self.prompt.format(&HashMap::from([
            ("input", query),
            ("agent_scratchpad", scratchpad),
        ]))
    }

    async fn observe(&self, tool: &str, input: &str) -> Result<String> {
        if self.tools.get(tool).is_none() {
            return Ok(format!(
                "{tool} is not a valid tool, try one of [{}].",
                self.tools.names().join(", ")
            ));
        }
        self.tools.call(tool, input).await
    }
}

#[async_trait]
impl<M: LanguageModel + ?Sized> AgentRunner for Agent<M> {
    async fn run(&self, query: &str) -> Result<String> {
        let mut scratchpad = String::new();

        for step in 1..=self.max_steps {
            let prompt = self.build_prompt(query, &scratchpad)?;
            let raw = self.model.complete(&prompt).await?;

            match parse_step(truncate_at_stop(&raw))? {
                AgentStep::Finish { answer, log } => {
                    tracing::debug!(%log, "agent thought");
                    tracing::info!(step, "agent produced a final answer");
                    return Ok(answer);
                }
                AgentStep::Action { tool, input, log } => {
                    tracing::debug!(%log, "agent thought");
                    tracing::info!(step, %tool, %input, "agent action");
                    let observation = self.observe(&tool, &input).await?;
                    tracing::debug!(%observation, "tool observation");

                    scratchpad.push_str(&log);
                    scratchpad.push_str("\nObservation: ");
                    scratchpad.push_str(&observation);
                    scratchpad.push_str("\nThought:");
                }
            }
        }

        tracing::warn!(max_steps = self.max_steps, "agent exhausted its step budget");
        Err(ResearchError::StepLimit(self.max_steps))
    }
}

fn react_prompt(tools: &ToolRegistry) -> PromptTemplate {
    let tool_lines = tools
        .describe()
        .iter()
        .map(|tool| format!("{}: {}", tool.name, tool.description))
        .collect::<Vec<_>>()
        .join("\n");
    let instructions = FORMAT_INSTRUCTIONS.replace("{tool_names}", &tools.names().join(", "));
    let template = [PREFIX, tool_lines.as_str(), instructions.as_str(), SUFFIX].join("\n\n");
    PromptTemplate::new(["input", "agent_scratchpad"], template)
}

/// Drops anything the model wrote after it started inventing an observation.
fn truncate_at_stop(raw: &str) -> &str {
    STOP_SEQUENCES
        .iter()
        .filter_map(|stop| raw.find(stop))
        .min()
        .map(|idx| &raw[..idx])
        .unwrap_or(raw)
}

/// Parses a ReAct completion into an action or a final answer.
pub fn parse_step(text: &str) -> Result<AgentStep> {
    let answer_at = text.find(FINAL_ANSWER);
    let action = action_pattern().captures(text);

    match (action, answer_at) {
        (Some(caps), Some(answer_idx)) => {
            let action_idx = caps.get(0).map(|m| m.start()).unwrap_or(0);
            if answer_idx >= action_idx {
                return Err(ResearchError::Parse(format!(
                    "both a final answer and a parse-able action: {text}"
                )));
            }
            // The answer came first; whatever follows is hallucinated.
            let start = answer_idx + FINAL_ANSWER.len();
            let end = text[start..]
                .find("\n\n")
                .map(|offset| start + offset)
                .unwrap_or(text.len());
            Ok(AgentStep::Finish {
                answer: text[start..end].trim().to_string(),
                log: text[..end].to_string(),
            })
        }
        (Some(caps), None) => {
            let tool = caps.get(1).map(|m| m.as_str()).unwrap_or_default().trim();
            let input = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            let input = input.trim_matches(' ');
            let input = if input.starts_with("SELECT ") {
                input
            } else {
                input.trim_matches('"')
            };
            Ok(AgentStep::Action {
                tool: tool.to_string(),
                input: input.to_string(),
                log: text.to_string(),
            })
        }
        (None, Some(_)) => {
            let last = text.rfind(FINAL_ANSWER).unwrap_or_default();
            Ok(AgentStep::Finish {
                answer: text[last + FINAL_ANSWER.len()..].trim().to_string(),
                log: text.to_string(),
            })
        }
        (None, None) => {
            if !text.contains("Action") {
                Err(ResearchError::Parse(format!(
                    "missing 'Action:' after 'Thought:' in {text}"
                )))
            } else {
                Err(ResearchError::Parse(text.to_string()))
            }
        }
    }
}

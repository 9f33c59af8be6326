//! Fixed instruction templates with named `{placeholder}` slots.

use std::collections::HashMap;

use crate::error::{ResearchError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    input_variables: Vec<String>,
    template: String,
}

impl PromptTemplate {
    pub fn new<I, S>(input_variables: I, template: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input_variables: input_variables.into_iter().map(Into::into).collect(),
            template: template.into(),
        }
    }

    /// Substitutes every declared variable in one pass. Values are inserted
    /// verbatim and never re-scanned; undeclared `{...}` text is left alone.
    pub fn format(&self, vars: &HashMap<&str, &str>) -> Result<String> {
        if let Some(missing) = self
            .input_variables
            .iter()
            .find(|name| !vars.contains_key(name.as_str()))
        {
            return Err(ResearchError::Template(format!(
                "missing input variable `{missing}`"
            )));
        }

        let mut rendered = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();
        while let Some(open) = rest.find('{') {
            rendered.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let substituted = after.find('}').and_then(|close| {
                let name = &after[..close];
                self.input_variables
                    .iter()
                    .any(|declared| declared == name)
                    .then(|| (vars[name], close))
            });
            match substituted {
                Some((value, close)) => {
                    rendered.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    rendered.push('{');
                    rest = after;
                }
            }
        }
        rendered.push_str(rest);
        Ok(rendered)
    }

    /// Shorthand for templates with a single input variable.
    pub fn format_single(&self, value: &str) -> Result<String> {
        match self.input_variables.as_slice() {
            [name] => self.format(&HashMap::from([(name.as_str(), value)])),
            vars => Err(ResearchError::Template(format!(
                "expected exactly one input variable, template declares {}",
                vars.len()
            ))),
        }
    }
}

pub fn search_prompt() -> PromptTemplate {
    PromptTemplate::new(
        ["query"],
        "You are a search engine. Please provide relevant information for: {query}",
    )
}

pub fn summarize_prompt() -> PromptTemplate {
    PromptTemplate::new(
        ["text"],
        "Please summarize the following text concisely: {text}",
    )
}

//! Prompt templates for Lectern.
//!
//! Prompts can be customized by placing an `assistant.toml` file in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub assistant: AssistantPrompts,
}

/// Prompts for the course assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantPrompts {
    /// System prompt sent with every request.
    pub system: String,
    /// Wrapper around the user's question. `{{query}}` is substituted.
    pub query: String,
    /// Header placed before the rendered conversation history.
    pub history_header: String,
}

impl Default for AssistantPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an assistant for course materials and educational content. You have a search tool over the indexed course lessons and an outline tool for course structure.

Tool usage:
- Search only for course-specific questions about particular course content or detailed lesson material
- Use the outline tool when asked what a course covers, its lessons, its link or its instructor
- Use at most one search per question
- Build the answer from what the tools return; if a search finds nothing, say so plainly

Answering:
- General knowledge questions: answer directly without using any tool
- Course-specific questions: search first, then answer
- Give the answer only. Do not describe your reasoning, your searches or the kind of question asked

Keep answers brief, educational and clear, with an example when it helps understanding."#
                .to_string(),
            query: "Answer this question about course materials: {{query}}".to_string(),
            history_header: "Previous conversation:".to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, applying overrides from the custom directory when present.
    pub fn load(custom_dir: Option<&str>) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let assistant_path = custom_path.join("assistant.toml");
            if assistant_path.exists() {
                let content = std::fs::read_to_string(&assistant_path)?;
                prompts.assistant = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Wrap a user question in the query template.
    pub fn render_query(&self, query: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), query.to_string());
        Self::render(&self.assistant.query, &vars)
    }
}

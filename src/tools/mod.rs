//! Tools the model may invoke while answering.

mod outline;
mod search;

pub use outline::{CourseOutlineTool, OUTLINE_TOOL_NAME};
pub use search::{CourseSearchTool, SEARCH_TOOL_NAME};

use crate::course::Source;
use crate::error::{LecternError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Schema advertised to the model for one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema for the arguments object.
    pub input_schema: Value,
}

/// Result of a tool execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Text handed back to the model.
    pub content: String,
    /// Citations for the content.
    pub sources: Vec<Source>,
}

impl ToolOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sources: Vec::new(),
        }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    async fn execute(&self, arguments: Value) -> Result<ToolOutput>;
}

/// Registry of tools keyed by name.
#[derive(Default, Clone)]
pub struct ToolManager {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        self.tools.insert(name, tool);
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Run the named tool with raw JSON arguments.
    #[instrument(skip(self, arguments))]
    pub async fn execute(&self, name: &str, arguments: &str) -> Result<ToolOutput> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| LecternError::ToolNotFound(name.to_string()))?;

        let arguments: Value = if arguments.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(arguments)
                .map_err(|e| LecternError::ToolArguments(format!("{}: {}", name, e)))?
        };

        info!("Executing tool {} with args: {}", name, arguments);
        tool.execute(arguments).await
    }
}

/// Deserialize tool arguments into a typed struct.
pub(crate) fn parse_arguments<T: serde::de::DeserializeOwned>(tool: &str, arguments: Value) -> Result<T> {
    serde_json::from_value(arguments).map_err(|e| LecternError::ToolArguments(format!("{}: {}", tool, e)))
}

//! Answer generation with a bounded tool-calling loop.

use crate::config::{AssistantPrompts, LlmSettings};
use crate::course::Source;
use crate::error::Result;
use crate::llm::{ChatMessage, ChatModel, ChatRequest};
use crate::tools::ToolManager;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Final answer plus the sources cited by the tools it used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generation {
    pub answer: String,
    pub sources: Vec<Source>,
}

/// Drives a [`ChatModel`], executing requested tools between calls.
pub struct AiGenerator {
    model: Arc<dyn ChatModel>,
    prompts: AssistantPrompts,
    temperature: f32,
    max_tokens: u32,
    max_tool_rounds: usize,
}

impl AiGenerator {
    pub fn new(model: Arc<dyn ChatModel>, prompts: AssistantPrompts) -> Self {
        let defaults = LlmSettings::default();
        Self {
            model,
            prompts,
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            max_tool_rounds: defaults.max_tool_rounds,
        }
    }

    /// Apply sampling and tool-round limits from settings.
    pub fn with_settings(mut self, settings: &LlmSettings) -> Self {
        self.temperature = settings.temperature;
        self.max_tokens = settings.max_tokens;
        self.max_tool_rounds = settings.max_tool_rounds;
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    fn system_prompt(&self, history: Option<&str>) -> String {
        match history {
            Some(history) if !history.is_empty() => format!(
                "{}\n\n{}\n{}",
                self.prompts.system, self.prompts.history_header, history
            ),
            _ => self.prompts.system.clone(),
        }
    }

    /// Answer `query`, letting the model call `tools` for up to
    /// `max_tool_rounds` rounds before a final call without tools.
    #[instrument(skip_all, fields(model = %self.model.model_name()))]
    pub async fn generate_response(
        &self,
        query: &str,
        history: Option<&str>,
        tools: Option<&ToolManager>,
    ) -> Result<Generation> {
        let definitions = tools.map(|t| t.definitions()).unwrap_or_default();
        let mut request = ChatRequest {
            system: self.system_prompt(history),
            messages: vec![ChatMessage::User(query.to_string())],
            tools: Vec::new(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut sources: Vec<Source> = Vec::new();
        let mut rounds = 0;

        loop {
            let offer_tools = rounds < self.max_tool_rounds && !definitions.is_empty();
            request.tools = if offer_tools { definitions.clone() } else { Vec::new() };

            let response = self.model.complete(&request).await?;

            let manager = match tools {
                Some(manager) if offer_tools && response.wants_tools() => manager,
                _ => {
                    if response.wants_tools() {
                        warn!("Model requested tools after tools were withdrawn; ignoring");
                    }
                    debug!(rounds, "Generation finished");
                    return Ok(Generation {
                        answer: response.content.unwrap_or_default(),
                        sources,
                    });
                }
            };

            rounds += 1;
            request.messages.push(ChatMessage::Assistant {
                content: response.content.clone(),
                tool_calls: response.tool_calls.clone(),
            });

            for call in &response.tool_calls {
                info!("Model calling tool: {} with args: {}", call.name, call.arguments);
                let content = match manager.execute(&call.name, &call.arguments).await {
                    Ok(output) => {
                        for source in output.sources {
                            if !sources.contains(&source) {
                                sources.push(source);
                            }
                        }
                        output.content
                    }
                    Err(e) => format!("Tool error: {}", e),
                };
                request.messages.push(ChatMessage::Tool {
                    call_id: call.id.clone(),
                    content,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LecternError;
    use crate::llm::ChatResponse;
    use crate::test_support::{tool_call, ScriptedChatModel};
    use crate::tools::{Tool, ToolDefinition, ToolOutput};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct FakeSearch;

    #[async_trait]
    impl Tool for FakeSearch {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "search_course_content".to_string(),
                description: "search".to_string(),
                input_schema: json!({"type": "object"}),
            }
        }

        async fn execute(&self, arguments: Value) -> Result<ToolOutput> {
            Ok(ToolOutput {
                content: format!("[Course A - Lesson 1]\nresult for {}", arguments["query"]),
                sources: vec![Source::new("Course A", Some(1), None)],
            })
        }
    }

    fn tools() -> ToolManager {
        let mut manager = ToolManager::new();
        manager.register(Arc::new(FakeSearch));
        manager
    }

    fn generator(model: Arc<ScriptedChatModel>) -> AiGenerator {
        AiGenerator::new(model, AssistantPrompts::default())
    }

    #[tokio::test]
    async fn test_direct_answer_without_tool_use() {
        let model = Arc::new(ScriptedChatModel::new(vec![ChatResponse::text("Paris")]));
        let tools = tools();

        let generation = generator(model.clone())
            .generate_response("capital of France?", None, Some(&tools))
            .await
            .unwrap();

        assert_eq!(generation.answer, "Paris");
        assert!(generation.sources.is_empty());

        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].tools.len(), 1);
        assert_eq!(requests[0].temperature, 0.0);
        assert_eq!(requests[0].max_tokens, 800);
        assert_eq!(requests[0].system, AssistantPrompts::default().system);
    }

    #[tokio::test]
    async fn test_tool_round_then_final_call_without_tools() {
        let model = Arc::new(ScriptedChatModel::new(vec![
            tool_call("call_1", "search_course_content", json!({"query": "loops"})),
            ChatResponse::text("Agents loop."),
        ]));
        let tools = tools();

        let generation = generator(model.clone())
            .generate_response("how do agents work?", None, Some(&tools))
            .await
            .unwrap();

        assert_eq!(generation.answer, "Agents loop.");
        assert_eq!(generation.sources, vec![Source::new("Course A", Some(1), None)]);

        let requests = model.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].tools.is_empty());
        assert_eq!(requests[1].messages.len(), 3);
        match &requests[1].messages[2] {
            ChatMessage::Tool { call_id, content } => {
                assert_eq!(call_id, "call_1");
                assert!(content.starts_with("[Course A - Lesson 1]"));
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_history_is_appended_to_system_prompt() {
        let model = Arc::new(ScriptedChatModel::new(vec![ChatResponse::text("ok")]));
        generator(model.clone())
            .generate_response("q", Some("User: hi\nAssistant: hello"), None)
            .await
            .unwrap();

        let system = &model.requests()[0].system;
        assert!(system.ends_with("\n\nPrevious conversation:\nUser: hi\nAssistant: hello"));
    }

    #[tokio::test]
    async fn test_no_tool_manager_sends_no_tools() {
        let model = Arc::new(ScriptedChatModel::new(vec![ChatResponse::text("ok")]));
        generator(model.clone()).generate_response("q", None, None).await.unwrap();
        assert!(model.requests()[0].tools.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tool_error_is_fed_back() {
        let model = Arc::new(ScriptedChatModel::new(vec![
            tool_call("call_1", "missing_tool", json!({})),
            ChatResponse::text("sorry"),
        ]));
        let tools = tools();

        let generation = generator(model.clone())
            .generate_response("q", None, Some(&tools))
            .await
            .unwrap();
        assert_eq!(generation.answer, "sorry");

        let requests = model.requests();
        assert_eq!(
            requests[1].messages[2],
            ChatMessage::Tool {
                call_id: "call_1".to_string(),
                content: "Tool error: Tool 'missing_tool' not found".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_multiple_tool_rounds() {
        let model = Arc::new(ScriptedChatModel::new(vec![
            tool_call("call_1", "search_course_content", json!({"query": "a"})),
            tool_call("call_2", "search_course_content", json!({"query": "b"})),
            ChatResponse::text("done"),
        ]));
        let tools = tools();

        let generation = generator(model.clone())
            .with_max_tool_rounds(2)
            .generate_response("q", None, Some(&tools))
            .await
            .unwrap();

        assert_eq!(generation.answer, "done");
        let requests = model.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1].tools.len(), 1);
        assert!(requests[2].tools.is_empty());
        assert_eq!(generation.sources.len(), 1);
    }

    #[tokio::test]
    async fn test_model_error_propagates() {
        let model = Arc::new(ScriptedChatModel::failing(LecternError::OpenAI(
            "rate limited".to_string(),
        )));
        let err = generator(model).generate_response("q", None, None).await.unwrap_err();
        assert!(err.to_string().contains("rate limited"));
    }
}

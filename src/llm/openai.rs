//! OpenAI chat-completions backend.

use super::{ChatMessage, ChatModel, ChatRequest, ChatResponse, ToolInvocation};
use crate::config::LlmSettings;
use crate::error::{LecternError, Result};
use crate::openai::create_client;
use crate::tools::ToolDefinition;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs, ChatCompletionTool,
    ChatCompletionToolChoiceOption, ChatCompletionToolType, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs, FunctionCall, FunctionObject,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Chat model backed by the OpenAI (or a compatible) API.
pub struct OpenAIChatModel {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAIChatModel {
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        Ok(Self::with_client(create_client(settings)?, &settings.model))
    }

    pub fn with_client(client: Client<OpenAIConfig>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }

    fn build_request(&self, request: &ChatRequest) -> Result<CreateChatCompletionRequest> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(request.messages.len() + 1);
        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system.clone())
                .build()
                .map_err(|e| LecternError::Llm(e.to_string()))?
                .into(),
        );
        for message in &request.messages {
            messages.push(to_openai_message(message)?);
        }

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .messages(messages)
            .temperature(request.temperature)
            .max_completion_tokens(request.max_tokens);

        if !request.tools.is_empty() {
            args.tools(request.tools.iter().map(to_openai_tool).collect::<Vec<_>>())
                .tool_choice(ChatCompletionToolChoiceOption::Auto);
        }

        args.build().map_err(|e| LecternError::Llm(e.to_string()))
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip(self, request), fields(model = %self.model, tools = request.tools.len()))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let response = self
            .client
            .chat()
            .create(self.build_request(request)?)
            .await
            .map_err(|e| LecternError::OpenAI(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LecternError::Llm("No response from model".to_string()))?;

        let tool_calls: Vec<ToolInvocation> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolInvocation {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();

        debug!(tool_calls = tool_calls.len(), "Received chat completion");

        Ok(ChatResponse {
            content: choice.message.content,
            tool_calls,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn to_openai_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let built: ChatCompletionRequestMessage = match message {
        ChatMessage::User(content) => ChatCompletionRequestUserMessageArgs::default()
            .content(content.clone())
            .build()
            .map_err(|e| LecternError::Llm(e.to_string()))?
            .into(),
        ChatMessage::Assistant {
            content,
            tool_calls,
        } => {
            let mut args = ChatCompletionRequestAssistantMessageArgs::default();
            if let Some(content) = content {
                args.content(content.clone());
            }
            if !tool_calls.is_empty() {
                args.tool_calls(
                    tool_calls
                        .iter()
                        .map(|call| ChatCompletionMessageToolCall {
                            id: call.id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: FunctionCall {
                                name: call.name.clone(),
                                arguments: call.arguments.clone(),
                            },
                        })
                        .collect::<Vec<_>>(),
                );
            }
            args.build().map_err(|e| LecternError::Llm(e.to_string()))?.into()
        }
        ChatMessage::Tool { call_id, content } => ChatCompletionRequestToolMessageArgs::default()
            .tool_call_id(call_id.clone())
            .content(content.clone())
            .build()
            .map_err(|e| LecternError::Llm(e.to_string()))?
            .into(),
    };
    Ok(built)
}

fn to_openai_tool(tool: &ToolDefinition) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: tool.name.clone(),
            description: Some(tool.description.clone()),
            parameters: Some(tool.input_schema.clone()),
            strict: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model() -> OpenAIChatModel {
        OpenAIChatModel::with_client(
            Client::with_config(OpenAIConfig::new().with_api_key("sk-test")),
            "gpt-4o-mini",
        )
    }

    fn search_tool() -> ToolDefinition {
        ToolDefinition {
            name: "search_course_content".to_string(),
            description: "Search".to_string(),
            input_schema: json!({"type": "object", "properties": {}}),
        }
    }

    #[test]
    fn test_request_with_tools_uses_auto_choice() {
        let request = ChatRequest {
            system: "system prompt".to_string(),
            messages: vec![ChatMessage::User("hello".to_string())],
            tools: vec![search_tool()],
            temperature: 0.0,
            max_tokens: 800,
        };

        let model = model();
        assert_eq!(model.model_name(), "gpt-4o-mini");

        let body = serde_json::to_value(model.build_request(&request).unwrap()).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["tools"][0]["function"]["name"], "search_course_content");
        assert_eq!(body["max_completion_tokens"], 800);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "system prompt");
        assert_eq!(body["messages"][1]["role"], "user");
    }

    #[test]
    fn test_request_without_tools_omits_tool_fields() {
        let request = ChatRequest {
            system: "s".to_string(),
            messages: vec![
                ChatMessage::User("q".to_string()),
                ChatMessage::Assistant {
                    content: None,
                    tool_calls: vec![ToolInvocation {
                        id: "call_1".to_string(),
                        name: "search_course_content".to_string(),
                        arguments: r#"{"query":"x"}"#.to_string(),
                    }],
                },
                ChatMessage::Tool {
                    call_id: "call_1".to_string(),
                    content: "result".to_string(),
                },
            ],
            tools: Vec::new(),
            temperature: 0.0,
            max_tokens: 100,
        };

        let body = serde_json::to_value(model().build_request(&request).unwrap()).unwrap();
        assert!(body.get("tools").map_or(true, |t| t.is_null()));
        assert!(body.get("tool_choice").map_or(true, |t| t.is_null()));
        assert_eq!(body["messages"][2]["tool_calls"][0]["id"], "call_1");
        assert_eq!(body["messages"][3]["role"], "tool");
        assert_eq!(body["messages"][3]["tool_call_id"], "call_1");
    }
}

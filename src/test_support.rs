//! Deterministic stand-ins for the external embedding and chat APIs.

use crate::embedding::Embedder;
use crate::error::{LecternError, Result};
use crate::llm::{ChatModel, ChatRequest, ChatResponse, ToolInvocation};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Bag-of-words embedder: each lowercase word is hashed into a bucket.
pub struct HashEmbedder {
    dimensions: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self { dimensions: 256 }
    }
}

fn fnv1a(word: &str) -> u64 {
    word.bytes().fold(0xcbf29ce484222325, |hash, b| {
        (hash ^ u64::from(b)).wrapping_mul(0x100000001b3)
    })
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0; self.dimensions];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = (fnv1a(&word.to_lowercase()) % self.dimensions as u64) as usize;
            vector[bucket] += 1.0;
        }
        Ok(vector)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Chat model that replays queued responses and records every request.
#[derive(Default)]
pub struct ScriptedChatModel {
    responses: Mutex<VecDeque<Result<ChatResponse>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChatModel {
    pub fn new(responses: Vec<ChatResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Ok).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A model whose next call fails with the given error.
    pub fn failing(error: LecternError) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from([Err(error)])),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ChatResponse::text("scripted default answer")))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// A tool call response for scripting.
pub fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> ChatResponse {
    ChatResponse {
        content: None,
        tool_calls: vec![ToolInvocation {
            id: id.to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }],
    }
}

/// A small two-course catalog document set.
pub const MCP_COURSE: &str = "Course Title: Introduction to MCP Servers
Course Link: https://example.com/mcp
Course Instructor: Ada Lovelace

Lesson 1: What is MCP
Lesson Link: https://example.com/mcp/1
MCP servers expose tools and resources to clients. Clients connect over stdio or HTTP.

Lesson 2: Building a server
A server registers tools with a name and an input schema.
";

pub const AGENTS_COURSE: &str = "Course Title: Building Agents with Rust
Course Link: https://example.com/agents
Course Instructor: Grace Hopper

Lesson 1: The agent loop
Agents call tools in a loop until the task is done.
";

//! `search_course_content`: semantic search over course chunks.

use super::{parse_arguments, Tool, ToolDefinition, ToolOutput};
use crate::course::{Course, Source};
use crate::error::{LecternError, Result};
use crate::rag::CourseRetriever;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

pub const SEARCH_TOOL_NAME: &str = "search_course_content";

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    course_name: Option<String>,
    #[serde(default)]
    lesson_number: Option<u32>,
}

/// Searches course content with optional course and lesson filters.
pub struct CourseSearchTool {
    retriever: Arc<CourseRetriever>,
}

impl CourseSearchTool {
    pub fn new(retriever: Arc<CourseRetriever>) -> Self {
        Self { retriever }
    }

    fn empty_message(course_name: Option<&str>, lesson_number: Option<u32>) -> String {
        let mut message = String::from("No relevant content found");
        if let Some(course) = course_name {
            message.push_str(&format!(" in course '{}'", course));
        }
        if let Some(lesson) = lesson_number {
            message.push_str(&format!(" in lesson {}", lesson));
        }
        message.push('.');
        message
    }
}

#[async_trait]
impl Tool for CourseSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: SEARCH_TOOL_NAME.to_string(),
            description: "Search course materials with smart course name matching and lesson filtering"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for in the course content"
                    },
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                    },
                    "lesson_number": {
                        "type": "integer",
                        "description": "Specific lesson number to search within (e.g. 1, 2, 3)"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutput> {
        let args: SearchArgs = parse_arguments(SEARCH_TOOL_NAME, arguments)?;

        let hits = match self
            .retriever
            .search(&args.query, args.course_name.as_deref(), args.lesson_number)
            .await
        {
            Ok(hits) => hits,
            Err(LecternError::CourseNotFound(name)) => {
                return Ok(ToolOutput::text(format!("No course found matching '{}'", name)));
            }
            Err(e) => return Err(e),
        };

        if hits.is_empty() {
            return Ok(ToolOutput::text(Self::empty_message(
                args.course_name.as_deref(),
                args.lesson_number,
            )));
        }

        let store = self.retriever.vector_store();
        let mut courses: HashMap<String, Option<Course>> = HashMap::new();
        let mut blocks = Vec::with_capacity(hits.len());
        let mut sources: Vec<Source> = Vec::new();

        for hit in &hits {
            let chunk = &hit.chunk;
            if !courses.contains_key(&chunk.course_title) {
                let course = store.get_course(&chunk.course_title).await?;
                courses.insert(chunk.course_title.clone(), course);
            }
            let link = courses
                .get(&chunk.course_title)
                .and_then(|c| c.as_ref())
                .and_then(|c| c.link_for(chunk.lesson_number));

            let source = Source::new(&chunk.course_title, chunk.lesson_number, link);
            blocks.push(format!("[{}]\n{}", source.label, chunk.content));
            if !sources.contains(&source) {
                sources.push(source);
            }
        }

        Ok(ToolOutput {
            content: blocks.join("\n\n"),
            sources,
        })
    }
}

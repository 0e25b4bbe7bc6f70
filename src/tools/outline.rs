//! `get_course_outline`: course metadata and lesson list.

use super::{parse_arguments, Tool, ToolDefinition, ToolOutput};
use crate::course::{Course, Source};
use crate::error::Result;
use crate::rag::CourseRetriever;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub const OUTLINE_TOOL_NAME: &str = "get_course_outline";

#[derive(Debug, Deserialize)]
struct OutlineArgs {
    course_name: String,
}

pub struct CourseOutlineTool {
    retriever: Arc<CourseRetriever>,
}

impl CourseOutlineTool {
    pub fn new(retriever: Arc<CourseRetriever>) -> Self {
        Self { retriever }
    }

    fn format_outline(course: &Course) -> String {
        let mut lines = vec![format!("Course: {}", course.title)];
        if let Some(link) = &course.link {
            lines.push(format!("Link: {}", link));
        }
        if let Some(instructor) = &course.instructor {
            lines.push(format!("Instructor: {}", instructor));
        }

        if course.lessons.is_empty() {
            lines.push("No lessons listed.".to_string());
        } else {
            lines.push(format!("Lessons ({}):", course.lessons.len()));
            for lesson in &course.lessons {
                lines.push(format!("Lesson {}: {}", lesson.number, lesson.title));
            }
        }

        lines.join("\n")
    }
}

#[async_trait]
impl Tool for CourseOutlineTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: OUTLINE_TOOL_NAME.to_string(),
            description: "Get a course's title, link, instructor and complete lesson list".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work)"
                    }
                },
                "required": ["course_name"]
            }),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutput> {
        let args: OutlineArgs = parse_arguments(OUTLINE_TOOL_NAME, arguments)?;

        let Some(title) = self.retriever.resolve_course_name(&args.course_name).await? else {
            return Ok(ToolOutput::text(format!(
                "No course found matching '{}'",
                args.course_name
            )));
        };

        let Some(course) = self.retriever.vector_store().get_course(&title).await? else {
            return Ok(ToolOutput::text(format!(
                "No course found matching '{}'",
                args.course_name
            )));
        };

        Ok(ToolOutput {
            content: Self::format_outline(&course),
            sources: vec![Source::new(&course.title, None, course.link.clone())],
        })
    }
}

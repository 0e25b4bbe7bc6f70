//! Course data model shared by ingestion, storage and retrieval.

use serde::{Deserialize, Serialize};

/// A lesson within a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub number: u32,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Lesson {
    pub fn new(number: u32, title: impl Into<String>) -> Self {
        Self {
            number,
            title: title.into(),
            link: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

/// A course. The title is its unique key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

impl Course {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: None,
            instructor: None,
            lessons: Vec::new(),
        }
    }

    /// Find a lesson by number.
    pub fn lesson(&self, number: u32) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.number == number)
    }

    /// Link for a lesson, falling back to the course link.
    pub fn link_for(&self, lesson_number: Option<u32>) -> Option<String> {
        lesson_number
            .and_then(|n| self.lesson(n))
            .and_then(|l| l.link.clone())
            .or_else(|| self.link.clone())
    }
}

/// A span of lesson text stored as a retrieval unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseChunk {
    /// Text content, including the course/lesson context prefix.
    pub content: String,
    pub course_title: String,
    /// None for documents without lesson markers.
    pub lesson_number: Option<u32>,
    /// Position of this chunk within its course.
    pub chunk_index: usize,
}

impl CourseChunk {
    /// Stable id used as the storage key.
    pub fn id(&self) -> String {
        format!("{}_{}", self.course_title, self.chunk_index)
    }
}

/// A citation attached to an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Display label, e.g. "Intro to MCP - Lesson 2".
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Source {
    pub fn new(course_title: &str, lesson_number: Option<u32>, link: Option<String>) -> Self {
        let label = match lesson_number {
            Some(n) => format!("{} - Lesson {}", course_title, n),
            None => course_title.to_string(),
        };
        Self { label, link }
    }
}

/// Summary of the indexed catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

//! Parser for the course document text format.
//!
//! ```text
//! Course Title: Building Agents
//! Course Link: https://example.com/agents
//! Course Instructor: Jane Doe
//!
//! Lesson 0: Introduction
//! Lesson Link: https://example.com/agents/0
//! Lesson body text...
//! ```

use crate::course::{Course, Lesson};
use crate::error::{LecternError, Result};
use regex::Regex;
use std::path::Path;

/// A parsed document: the course record plus the raw body of each lesson.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub course: Course,
    /// Lesson number (None for documents without lesson markers) and body text.
    pub sections: Vec<(Option<u32>, String)>,
}

/// Line-oriented parser for course documents.
pub struct CourseParser {
    title_re: Regex,
    link_re: Regex,
    instructor_re: Regex,
    lesson_re: Regex,
    lesson_link_re: Regex,
}

impl CourseParser {
    pub fn new() -> Self {
        Self {
            title_re: Regex::new(r"(?i)^course\s+title:\s*(.*)$").expect("Invalid regex"),
            link_re: Regex::new(r"(?i)^course\s+link:\s*(.*)$").expect("Invalid regex"),
            instructor_re: Regex::new(r"(?i)^course\s+instructor:\s*(.*)$").expect("Invalid regex"),
            lesson_re: Regex::new(r"(?i)^lesson\s+(\d+)\s*:\s*(.*)$").expect("Invalid regex"),
            lesson_link_re: Regex::new(r"(?i)^lesson\s+link:\s*(.+)$").expect("Invalid regex"),
        }
    }

    /// Parse document text. `origin` is only used in error messages.
    pub fn parse(&self, text: &str, origin: &Path) -> Result<ParsedDocument> {
        let lines: Vec<&str> = text.lines().map(|l| l.trim_end()).collect();
        let mut idx = 0;

        let mut title: Option<String> = None;
        let mut link: Option<String> = None;
        let mut instructor: Option<String> = None;

        // Header block: any order, blank lines allowed, ends at the first other line.
        while idx < lines.len() {
            let line = lines[idx].trim();
            if line.is_empty() {
                idx += 1;
                continue;
            }
            if let Some(caps) = self.title_re.captures(line) {
                title = Some(caps[1].trim().to_string());
            } else if let Some(caps) = self.link_re.captures(line) {
                link = non_empty(&caps[1]);
            } else if let Some(caps) = self.instructor_re.captures(line) {
                instructor = non_empty(&caps[1]);
            } else {
                break;
            }
            idx += 1;
        }

        let title = match title {
            Some(t) if !t.is_empty() => t,
            Some(_) => return Err(LecternError::parse(origin, "empty 'Course Title:' header")),
            None => return Err(LecternError::parse(origin, "missing 'Course Title:' header")),
        };

        let mut course = Course::new(title);
        course.link = link;
        course.instructor = instructor;

        let mut sections: Vec<(Option<u32>, String)> = Vec::new();
        let mut preamble: Vec<&str> = Vec::new();
        let mut current: Option<(Lesson, Vec<&str>)> = None;

        while idx < lines.len() {
            let line = lines[idx];

            if let Some(caps) = self.lesson_re.captures(line.trim()) {
                if let Some((lesson, body)) = current.take() {
                    Self::finish_lesson(&mut course, &mut sections, lesson, &body);
                }

                let number: u32 = caps[1]
                    .parse()
                    .map_err(|_| LecternError::parse(origin, format!("bad lesson number '{}'", &caps[1])))?;
                let mut lesson = Lesson::new(number, caps[2].trim());

                if let Some(next) = lines.get(idx + 1) {
                    if let Some(link_caps) = self.lesson_link_re.captures(next.trim()) {
                        lesson.link = non_empty(&link_caps[1]);
                        idx += 1;
                    }
                }

                current = Some((lesson, Vec::new()));
            } else if let Some((_, body)) = current.as_mut() {
                body.push(line);
            } else {
                preamble.push(line);
            }

            idx += 1;
        }

        if let Some((lesson, body)) = current.take() {
            Self::finish_lesson(&mut course, &mut sections, lesson, &body);
        }

        if course.lessons.is_empty() {
            let body = preamble.join("\n");
            let body = body.trim();
            if !body.is_empty() {
                sections.push((None, body.to_string()));
            }
        }

        Ok(ParsedDocument { course, sections })
    }

    fn finish_lesson(
        course: &mut Course,
        sections: &mut Vec<(Option<u32>, String)>,
        lesson: Lesson,
        body: &[&str],
    ) {
        let text = body.join("\n");
        let text = text.trim();
        if !text.is_empty() {
            sections.push((Some(lesson.number), text.to_string()));
        }
        course.lessons.push(lesson);
    }
}

impl Default for CourseParser {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

//! Courses command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::vector_store::create_vector_store;
use anyhow::Result;

/// List indexed courses. Reads the store directly, no API key needed.
pub async fn run_courses(with_lessons: bool, settings: Settings) -> Result<()> {
    preflight::check(Operation::Browse, &settings)?;
    let store = create_vector_store(&settings)?;

    let courses = match store.all_courses().await {
        Ok(courses) => courses,
        Err(e) => {
            Output::error(&format!("Failed to list courses: {}", e));
            return Err(e.into());
        }
    };

    if courses.is_empty() {
        Output::info("No courses indexed yet. Use 'lectern ingest <path>' to add some.");
        return Ok(());
    }

    Output::header(&format!("Indexed Courses ({})", courses.len()));
    println!();
    for course in &courses {
        Output::course_info(course, with_lessons);
    }

    println!();
    Output::kv("Total courses", &courses.len().to_string());
    Output::kv("Total chunks", &store.chunk_count().await?.to_string());

    Ok(())
}

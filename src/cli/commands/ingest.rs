//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::RagSystem;
use anyhow::Result;

/// Index one course file or every document in a folder.
pub async fn run_ingest(path: Option<String>, clear: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ingest, &settings) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    let path = path
        .map(|p| Settings::expand_path(&p))
        .unwrap_or_else(|| settings.docs_dir());
    let rag = RagSystem::new(settings)?;

    if path.is_file() {
        if clear {
            rag.vector_store().clear().await?;
            Output::info("Cleared existing courses.");
        }
        let spinner = Output::spinner(&format!("Indexing {}...", path.display()));
        let result = rag.add_course_document(&path).await;
        spinner.finish_and_clear();

        let (course, chunks) = result?;
        Output::success(&format!(
            "Indexed '{}' ({} lessons, {} chunks)",
            course.title,
            course.lessons.len(),
            chunks
        ));
        return Ok(());
    }

    if !path.is_dir() {
        let message = format!("No such file or folder: {}", path.display());
        Output::error(&message);
        anyhow::bail!(message);
    }

    let spinner = Output::spinner(&format!("Indexing courses in {}...", path.display()));
    let result = rag.add_course_folder(&path, clear).await;
    spinner.finish_and_clear();
    let summary = result?;

    Output::success(&format!(
        "Added {} courses with {} chunks",
        summary.courses, summary.chunks
    ));
    if summary.skipped > 0 {
        Output::info(&format!("{} already indexed, skipped", summary.skipped));
    }
    if summary.failed > 0 {
        Output::warning(&format!(
            "{} documents could not be indexed (run with -v for details)",
            summary.failed
        ));
    }

    Ok(())
}


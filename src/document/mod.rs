//! Course document ingestion: parsing and chunking.

mod chunker;
mod parser;

pub use chunker::{ChunkingConfig, SentenceChunker};
pub use parser::{CourseParser, ParsedDocument};

use crate::course::{Course, CourseChunk};
use crate::error::{LecternError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// File extensions picked up when ingesting a folder.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["txt", "md"];

/// Turns course documents into a course record and its chunks.
pub struct DocumentProcessor {
    parser: CourseParser,
    chunker: SentenceChunker,
}

impl DocumentProcessor {
    pub fn new(config: ChunkingConfig) -> Self {
        Self {
            parser: CourseParser::new(),
            chunker: SentenceChunker::new(config),
        }
    }

    /// Read a document, rejecting files that are not valid UTF-8.
    pub fn read_file(&self, path: &Path) -> Result<String> {
        let bytes = std::fs::read(path)?;
        String::from_utf8(bytes)
            .map_err(|e| LecternError::parse(path, format!("not valid UTF-8: {}", e.utf8_error())))
    }

    /// Parse and chunk the document at `path`.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn process_course_document(&self, path: &Path) -> Result<(Course, Vec<CourseChunk>)> {
        let text = self.read_file(path)?;
        self.process_text(&text, path)
    }

    /// Parse and chunk already loaded document text.
    pub fn process_text(&self, text: &str, origin: &Path) -> Result<(Course, Vec<CourseChunk>)> {
        let ParsedDocument { course, sections } = self.parser.parse(text, origin)?;

        let mut chunks = Vec::new();
        for (lesson_number, body) in &sections {
            let prefix = match lesson_number {
                Some(n) => format!("Course {} Lesson {} content: ", course.title, n),
                None => format!("Course {} content: ", course.title),
            };

            for piece in self.chunker.chunk(body) {
                chunks.push(CourseChunk {
                    content: format!("{}{}", prefix, piece),
                    course_title: course.title.clone(),
                    lesson_number: *lesson_number,
                    chunk_index: chunks.len(),
                });
            }
        }

        debug!(
            course = %course.title,
            lessons = course.lessons.len(),
            chunks = chunks.len(),
            "Processed course document"
        );

        Ok((course, chunks))
    }
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new(ChunkingConfig::default())
    }
}

/// List course documents directly inside `dir`, sorted by file name.
pub fn list_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(LecternError::InvalidInput(format!(
            "Not a directory: {}",
            dir.display()
        )));
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_document(path))
        .collect();
    files.sort();
    Ok(files)
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| DOCUMENT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

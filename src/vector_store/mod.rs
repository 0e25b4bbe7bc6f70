//! Vector store abstraction for Lectern.
//!
//! Two logical collections live behind one trait: the course catalog (one
//! entry per course, embedded by title) and the content chunks.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::config::{Settings, VectorStoreProvider};
use crate::course::{Course, CourseChunk};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A chunk together with its embedding, ready to be stored.
#[derive(Debug, Clone)]
pub struct StoredChunk {
    pub chunk: CourseChunk,
    pub embedding: Vec<f32>,
}

/// Restricts a content search to a course and/or lesson.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub course_title: Option<String>,
    pub lesson_number: Option<u32>,
}

impl SearchFilter {
    pub fn course(title: impl Into<String>) -> Self {
        Self {
            course_title: Some(title.into()),
            lesson_number: None,
        }
    }

    pub fn with_lesson(mut self, lesson_number: Option<u32>) -> Self {
        self.lesson_number = lesson_number;
        self
    }

    fn matches(&self, chunk: &CourseChunk) -> bool {
        self.course_title
            .as_deref()
            .map_or(true, |t| t == chunk.course_title)
            && self
                .lesson_number
                .map_or(true, |n| chunk.lesson_number == Some(n))
    }
}

/// A content search hit.
#[derive(Debug, Clone)]
pub struct ChunkMatch {
    pub chunk: CourseChunk,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// A catalog search hit.
#[derive(Debug, Clone)]
pub struct CourseMatch {
    pub course: Course,
    pub score: f32,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store or replace a course's catalog entry.
    async fn upsert_course(&self, course: &Course, title_embedding: &[f32]) -> Result<()>;

    /// Store or replace chunks, keyed by [`CourseChunk::id`].
    async fn upsert_chunks(&self, chunks: &[StoredChunk]) -> Result<usize>;

    /// Drop every chunk of `course_title` and store `chunks` in its place.
    async fn replace_course_chunks(&self, course_title: &str, chunks: &[StoredChunk]) -> Result<usize>;

    /// Top `limit` chunks by similarity, restricted by `filter`.
    async fn search_content(
        &self,
        query_embedding: &[f32],
        filter: &SearchFilter,
        limit: usize,
    ) -> Result<Vec<ChunkMatch>>;

    /// Top `limit` catalog entries by title similarity.
    async fn search_catalog(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<CourseMatch>>;

    /// Titles of all known courses, sorted.
    async fn course_titles(&self) -> Result<Vec<String>>;

    async fn course_count(&self) -> Result<usize>;

    async fn get_course(&self, title: &str) -> Result<Option<Course>>;

    /// All catalog entries, sorted by title.
    async fn all_courses(&self) -> Result<Vec<Course>>;

    async fn chunk_count(&self) -> Result<usize>;

    /// Remove every course and chunk.
    async fn clear(&self) -> Result<()>;
}

/// Create the store selected in settings.
pub fn create_vector_store(settings: &Settings) -> Result<Arc<dyn VectorStore>> {
    Ok(match settings.vector_store.provider {
        VectorStoreProvider::Sqlite => Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?),
        VectorStoreProvider::Memory => Arc::new(MemoryVectorStore::new()),
    })
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Sort by descending score and keep the first `limit`.
fn rank<T>(mut items: Vec<(f32, T)>, limit: usize) -> Vec<(f32, T)> {
    items.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    items.truncate(limit);
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);

        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_search_filter_matches() {
        let chunk = CourseChunk {
            content: "c".to_string(),
            course_title: "Rust".to_string(),
            lesson_number: Some(2),
            chunk_index: 0,
        };

        assert!(SearchFilter::default().matches(&chunk));
        assert!(SearchFilter::course("Rust").matches(&chunk));
        assert!(SearchFilter::course("Rust").with_lesson(Some(2)).matches(&chunk));
        assert!(!SearchFilter::course("Rust").with_lesson(Some(3)).matches(&chunk));
        assert!(!SearchFilter::course("Go").matches(&chunk));
    }

    #[test]
    fn test_rank_orders_and_truncates() {
        let ranked = rank(vec![(0.1, "a"), (0.9, "b"), (0.5, "c")], 2);
        let names: Vec<&str> = ranked.into_iter().map(|(_, n)| n).collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn test_create_memory_store() {
        let mut settings = Settings::default();
        settings.vector_store.provider = VectorStoreProvider::Memory;
        assert!(create_vector_store(&settings).is_ok());
    }
}

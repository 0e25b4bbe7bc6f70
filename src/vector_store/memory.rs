//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets.

use super::{
    cosine_similarity, rank, ChunkMatch, CourseMatch, SearchFilter, StoredChunk, VectorStore,
};
use crate::course::Course;
use crate::error::{LecternError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Collections {
    courses: HashMap<String, (Course, Vec<f32>)>,
    chunks: HashMap<String, StoredChunk>,
}

/// In-memory vector store.
#[derive(Default)]
pub struct MemoryVectorStore {
    inner: RwLock<Collections>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Collections>> {
        self.inner
            .read()
            .map_err(|e| LecternError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Collections>> {
        self.inner
            .write()
            .map_err(|e| LecternError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_course(&self, course: &Course, title_embedding: &[f32]) -> Result<()> {
        self.write()?
            .courses
            .insert(course.title.clone(), (course.clone(), title_embedding.to_vec()));
        Ok(())
    }

    async fn upsert_chunks(&self, chunks: &[StoredChunk]) -> Result<usize> {
        let mut inner = self.write()?;
        for stored in chunks {
            inner.chunks.insert(stored.chunk.id(), stored.clone());
        }
        Ok(chunks.len())
    }

    async fn replace_course_chunks(&self, course_title: &str, chunks: &[StoredChunk]) -> Result<usize> {
        let mut inner = self.write()?;
        inner.chunks.retain(|_, s| s.chunk.course_title != course_title);
        for stored in chunks {
            inner.chunks.insert(stored.chunk.id(), stored.clone());
        }
        Ok(chunks.len())
    }

    async fn search_content(
        &self,
        query_embedding: &[f32],
        filter: &SearchFilter,
        limit: usize,
    ) -> Result<Vec<ChunkMatch>> {
        let inner = self.read()?;
        let scored = inner
            .chunks
            .values()
            .filter(|s| filter.matches(&s.chunk))
            .map(|s| (cosine_similarity(query_embedding, &s.embedding), s.chunk.clone()))
            .collect();

        Ok(rank(scored, limit)
            .into_iter()
            .map(|(score, chunk)| ChunkMatch { chunk, score })
            .collect())
    }

    async fn search_catalog(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<CourseMatch>> {
        let inner = self.read()?;
        let scored = inner
            .courses
            .values()
            .map(|(course, emb)| (cosine_similarity(query_embedding, emb), course.clone()))
            .collect();

        Ok(rank(scored, limit)
            .into_iter()
            .map(|(score, course)| CourseMatch { course, score })
            .collect())
    }

    async fn course_titles(&self) -> Result<Vec<String>> {
        let mut titles: Vec<String> = self.read()?.courses.keys().cloned().collect();
        titles.sort();
        Ok(titles)
    }

    async fn course_count(&self) -> Result<usize> {
        Ok(self.read()?.courses.len())
    }

    async fn get_course(&self, title: &str) -> Result<Option<Course>> {
        Ok(self.read()?.courses.get(title).map(|(c, _)| c.clone()))
    }

    async fn all_courses(&self) -> Result<Vec<Course>> {
        let mut courses: Vec<Course> = self.read()?.courses.values().map(|(c, _)| c.clone()).collect();
        courses.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(courses)
    }

    async fn chunk_count(&self) -> Result<usize> {
        Ok(self.read()?.chunks.len())
    }

    async fn clear(&self) -> Result<()> {
        let mut inner = self.write()?;
        inner.courses.clear();
        inner.chunks.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::CourseChunk;

    fn stored(title: &str, lesson: Option<u32>, index: usize, embedding: Vec<f32>) -> StoredChunk {
        StoredChunk {
            chunk: CourseChunk {
                content: format!("{} {}", title, index),
                course_title: title.to_string(),
                lesson_number: lesson,
                chunk_index: index,
            },
            embedding,
        }
    }

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new();

        store
            .upsert_chunks(&[
                stored("Rust", Some(1), 0, vec![1.0, 0.0, 0.0]),
                stored("Rust", Some(1), 1, vec![0.0, 1.0, 0.0]),
                stored("Go", Some(1), 0, vec![1.0, 0.0, 0.0]),
            ])
            .await
            .unwrap();
        assert_eq!(store.chunk_count().await.unwrap(), 3);

        let results = store
            .search_content(&[1.0, 0.0, 0.0], &SearchFilter::course("Rust"), 10)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score > results[1].score);
        assert_eq!(results[0].chunk.chunk_index, 0);
    }

    #[tokio::test]
    async fn test_replace_course_chunks_drops_stale_ones() {
        let store = MemoryVectorStore::new();
        store
            .upsert_chunks(&[
                stored("Rust", Some(1), 0, vec![1.0]),
                stored("Rust", Some(1), 1, vec![1.0]),
                stored("Rust", Some(2), 2, vec![1.0]),
                stored("Go", Some(1), 0, vec![1.0]),
            ])
            .await
            .unwrap();

        let replaced = store
            .replace_course_chunks("Rust", &[stored("Rust", Some(1), 0, vec![0.5])])
            .await
            .unwrap();
        assert_eq!(replaced, 1);
        assert_eq!(store.chunk_count().await.unwrap(), 2);

        let rust = store
            .search_content(&[1.0], &SearchFilter::course("Rust"), 10)
            .await
            .unwrap();
        assert_eq!(rust.len(), 1);
        assert_eq!(rust[0].chunk.chunk_index, 0);
    }

    #[tokio::test]
    async fn test_catalog() {
        let store = MemoryVectorStore::new();
        store.upsert_course(&Course::new("Rust"), &[1.0, 0.0]).await.unwrap();
        store.upsert_course(&Course::new("Go"), &[0.0, 1.0]).await.unwrap();
        store.upsert_course(&Course::new("Go"), &[0.0, 1.0]).await.unwrap();

        assert_eq!(store.course_count().await.unwrap(), 2);
        assert_eq!(store.course_titles().await.unwrap(), vec!["Go", "Rust"]);

        let hits = store.search_catalog(&[0.1, 0.9], 5).await.unwrap();
        assert_eq!(hits[0].course.title, "Go");

        store.clear().await.unwrap();
        assert!(store.all_courses().await.unwrap().is_empty());
    }
}

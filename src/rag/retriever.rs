//! Course-aware semantic retrieval.

use crate::embedding::Embedder;
use crate::error::{LecternError, Result};
use crate::vector_store::{ChunkMatch, SearchFilter, VectorStore};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Embeds queries and searches the store, resolving fuzzy course names first.
pub struct CourseRetriever {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    max_results: usize,
}

impl CourseRetriever {
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            vector_store,
            embedder,
            max_results: 5,
        }
    }

    /// Set the maximum number of chunks returned per search.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Map a user-supplied course name to a stored title.
    ///
    /// Case-insensitive exact match, then substring match, then the nearest
    /// catalog entry by title embedding. `None` only when the catalog is empty.
    #[instrument(skip(self))]
    pub async fn resolve_course_name(&self, name: &str) -> Result<Option<String>> {
        let titles = self.vector_store.course_titles().await?;
        if titles.is_empty() {
            return Ok(None);
        }

        let wanted = name.trim().to_lowercase();
        if let Some(title) = titles.iter().find(|t| t.to_lowercase() == wanted) {
            return Ok(Some(title.clone()));
        }
        if !wanted.is_empty() {
            if let Some(title) = titles.iter().find(|t| t.to_lowercase().contains(&wanted)) {
                return Ok(Some(title.clone()));
            }
        }

        let embedding = self.embedder.embed(name).await?;
        let nearest = self.vector_store.search_catalog(&embedding, 1).await?;
        let resolved = nearest.into_iter().next().map(|m| m.course.title);
        debug!(resolved = ?resolved, "Resolved course name by similarity");
        Ok(resolved)
    }

    /// Search content, optionally restricted to a course and lesson.
    ///
    /// Fails with [`LecternError::CourseNotFound`] when a course name is given
    /// but nothing can be resolved.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
    ) -> Result<Vec<ChunkMatch>> {
        let mut filter = SearchFilter::default().with_lesson(lesson_number);

        if let Some(name) = course_name {
            let title = self
                .resolve_course_name(name)
                .await?
                .ok_or_else(|| LecternError::CourseNotFound(name.to_string()))?;
            filter.course_title = Some(title);
        }

        let embedding = self.embedder.embed(query).await?;
        let hits = self
            .vector_store
            .search_content(&embedding, &filter, self.max_results)
            .await?;

        debug!("Retrieved {} chunks", hits.len());
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::{Course, CourseChunk};
    use crate::test_support::HashEmbedder;
    use crate::vector_store::{MemoryVectorStore, StoredChunk};

    async fn retriever() -> CourseRetriever {
        let store: Arc<dyn VectorStore> = Arc::new(MemoryVectorStore::new());
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::default());

        for (title, texts) in [
            ("Introduction to MCP Servers", vec!["servers expose tools", "clients connect"]),
            ("Building Agents with Rust", vec!["agents call tools in a loop", "ownership rules"]),
        ] {
            let course = Course::new(title);
            store
                .upsert_course(&course, &embedder.embed(title).await.unwrap())
                .await
                .unwrap();
            let mut chunks = Vec::new();
            for (i, text) in texts.iter().enumerate() {
                chunks.push(StoredChunk {
                    chunk: CourseChunk {
                        content: text.to_string(),
                        course_title: title.to_string(),
                        lesson_number: Some(i as u32 + 1),
                        chunk_index: i,
                    },
                    embedding: embedder.embed(text).await.unwrap(),
                });
            }
            store.upsert_chunks(&chunks).await.unwrap();
        }

        CourseRetriever::new(store, embedder).with_max_results(5)
    }

    #[tokio::test]
    async fn test_resolve_exact_and_partial() {
        let r = retriever().await;
        assert_eq!(
            r.resolve_course_name("building agents with rust").await.unwrap().as_deref(),
            Some("Building Agents with Rust")
        );
        assert_eq!(
            r.resolve_course_name("MCP").await.unwrap().as_deref(),
            Some("Introduction to MCP Servers")
        );
    }

    #[tokio::test]
    async fn test_resolve_falls_back_to_similarity() {
        let r = retriever().await;
        let resolved = r.resolve_course_name("rust agents course").await.unwrap();
        assert_eq!(resolved.as_deref(), Some("Building Agents with Rust"));
    }

    #[tokio::test]
    async fn test_resolve_with_empty_catalog() {
        let r = CourseRetriever::new(
            Arc::new(MemoryVectorStore::new()),
            Arc::new(HashEmbedder::default()),
        );
        assert_eq!(r.resolve_course_name("anything").await.unwrap(), None);

        let err = r.search("q", Some("anything"), None).await.unwrap_err();
        assert!(matches!(err, LecternError::CourseNotFound(name) if name == "anything"));
    }

    #[tokio::test]
    async fn test_search_filters_by_course_and_lesson() {
        let r = retriever().await;

        let hits = r.search("tools", Some("Agents"), None).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.chunk.course_title == "Building Agents with Rust"));

        let hits = r.search("tools", Some("MCP"), Some(2)).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.content, "clients connect");
    }

    #[tokio::test]
    async fn test_search_without_filter_ranks_best_first() {
        let r = retriever().await;
        let hits = r.search("agents call tools", None, None).await.unwrap();
        assert_eq!(hits.len(), 4);
        assert_eq!(hits[0].chunk.content, "agents call tools in a loop");
    }
}

//! RAG system orchestrator for Lectern.
//!
//! Wires document processing, the vector store, tools, the generator and
//! session history together behind one entry point.

use crate::config::{Prompts, Settings};
use crate::course::{Course, CourseAnalytics, CourseChunk, Source};
use crate::document::{list_documents, ChunkingConfig, DocumentProcessor};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::llm::{ChatModel, OpenAIChatModel};
use crate::rag::{AiGenerator, CourseRetriever, SessionManager};
use crate::tools::{CourseOutlineTool, CourseSearchTool, ToolManager};
use crate::vector_store::{create_vector_store, StoredChunk, VectorStore};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Outcome of loading a folder of course documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FolderIngest {
    /// Courses newly added.
    pub courses: usize,
    /// Chunks newly added.
    pub chunks: usize,
    /// Documents skipped because their title was already indexed.
    pub skipped: usize,
    /// Documents that failed to parse or index.
    pub failed: usize,
}

/// Answer to a query, with its citations and the session it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryAnswer {
    pub answer: String,
    pub sources: Vec<Source>,
    pub session_id: String,
}

/// The main entry point: ingestion, querying and catalog analytics.
pub struct RagSystem {
    settings: Settings,
    prompts: Prompts,
    processor: DocumentProcessor,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    tools: ToolManager,
    generator: AiGenerator,
    sessions: SessionManager,
}

impl RagSystem {
    /// Create a system backed by OpenAI and the configured vector store.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;
        let prompts = Prompts::load(settings.prompts.custom_dir.as_deref())?;

        let embedder: Arc<dyn Embedder> =
            Arc::new(OpenAIEmbedder::from_settings(&settings.llm, &settings.embedding)?);
        let model: Arc<dyn ChatModel> = Arc::new(OpenAIChatModel::from_settings(&settings.llm)?);
        let vector_store = create_vector_store(&settings)?;

        info!(
            model = %settings.llm.model,
            embedding_model = %settings.embedding.model,
            store = %settings.vector_store.provider,
            "Initialized RAG system"
        );

        Ok(Self::with_components(settings, prompts, embedder, vector_store, model))
    }

    /// Create a system with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        model: Arc<dyn ChatModel>,
    ) -> Self {
        let processor = DocumentProcessor::new(ChunkingConfig::from(&settings.chunking));

        let retriever = Arc::new(
            CourseRetriever::new(vector_store.clone(), embedder.clone())
                .with_max_results(settings.rag.max_results),
        );
        let mut tools = ToolManager::new();
        tools.register(Arc::new(CourseSearchTool::new(retriever.clone())));
        tools.register(Arc::new(CourseOutlineTool::new(retriever)));

        let generator =
            AiGenerator::new(model, prompts.assistant.clone()).with_settings(&settings.llm);
        let sessions = SessionManager::new(settings.rag.max_history);

        Self {
            settings,
            prompts,
            processor,
            embedder,
            vector_store,
            tools,
            generator,
            sessions,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone()
    }

    pub fn session_manager(&self) -> &SessionManager {
        &self.sessions
    }

    /// Parse, chunk, embed and store one course document.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn add_course_document(&self, path: &Path) -> Result<(Course, usize)> {
        let (course, chunks) = self.processor.process_course_document(path)?;
        let count = self.index_course(&course, chunks).await?;
        Ok((course, count))
    }

    /// Load every `.txt`/`.md` document in `dir`, skipping courses whose
    /// title is already indexed. With `clear_existing` the store is emptied first.
    #[instrument(skip(self), fields(dir = %dir.display()))]
    pub async fn add_course_folder(&self, dir: &Path, clear_existing: bool) -> Result<FolderIngest> {
        if clear_existing {
            info!("Clearing existing course data");
            self.vector_store.clear().await?;
        }

        let mut known: HashSet<String> = self.vector_store.course_titles().await?.into_iter().collect();
        let mut summary = FolderIngest::default();

        for path in list_documents(dir)? {
            let (course, chunks) = match self.processor.process_course_document(&path) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    summary.failed += 1;
                    continue;
                }
            };

            if known.contains(&course.title) {
                debug!("Course already indexed: {}", course.title);
                summary.skipped += 1;
                continue;
            }

            match self.index_course(&course, chunks).await {
                Ok(count) => {
                    info!("Added course: {} ({} chunks)", course.title, count);
                    summary.courses += 1;
                    summary.chunks += count;
                    known.insert(course.title);
                }
                Err(e) => {
                    warn!("Failed to index {}: {}", path.display(), e);
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }

    async fn index_course(&self, course: &Course, chunks: Vec<CourseChunk>) -> Result<usize> {
        let title_embedding = self.embedder.embed(&course.title).await?;

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        let stored: Vec<StoredChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| StoredChunk { chunk, embedding })
            .collect();

        self.vector_store.upsert_course(course, &title_embedding).await?;
        // Re-ingesting a shorter document must not leave its old tail behind.
        self.vector_store.replace_course_chunks(&course.title, &stored).await
    }

    /// Answer a question within a session, creating one when none is given.
    #[instrument(skip(self, query))]
    pub async fn query(&self, query: &str, session_id: Option<&str>) -> Result<QueryAnswer> {
        let session_id = match session_id {
            Some(id) => id.to_string(),
            None => self.sessions.create_session()?,
        };

        let history = self.sessions.formatted_history(&session_id)?;
        let prompt = self.prompts.render_query(query);

        let generation = self
            .generator
            .generate_response(&prompt, history.as_deref(), Some(&self.tools))
            .await?;

        self.sessions.add_exchange(&session_id, query, &generation.answer)?;

        Ok(QueryAnswer {
            answer: generation.answer,
            sources: generation.sources,
            session_id,
        })
    }

    /// Number and titles of indexed courses.
    pub async fn course_analytics(&self) -> Result<CourseAnalytics> {
        let course_titles = self.vector_store.course_titles().await?;
        Ok(CourseAnalytics {
            total_courses: course_titles.len(),
            course_titles,
        })
    }
}

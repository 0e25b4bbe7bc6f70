//! SQLite-based vector store implementation.
//!
//! Embeddings are stored as little-endian f32 blobs and cosine similarity is
//! computed in Rust over the filtered rows.

use super::{
    cosine_similarity, rank, ChunkMatch, CourseMatch, SearchFilter, StoredChunk, VectorStore,
};
use crate::course::{Course, CourseChunk, Lesson};
use crate::error::{LecternError, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS courses (
        title TEXT PRIMARY KEY,
        instructor TEXT,
        link TEXT,
        lessons_json TEXT NOT NULL,
        embedding BLOB NOT NULL
    );

    CREATE TABLE IF NOT EXISTS chunks (
        id TEXT PRIMARY KEY,
        course_title TEXT NOT NULL,
        lesson_number INTEGER,
        chunk_index INTEGER NOT NULL,
        content TEXT NOT NULL,
        embedding BLOB NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_chunks_course ON chunks(course_title, lesson_number);
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open (or create) a store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| LecternError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn insert_chunks(conn: &Connection, chunks: &[StoredChunk]) -> Result<()> {
        let mut stmt = conn.prepare(
            r#"
            INSERT OR REPLACE INTO chunks
            (id, course_title, lesson_number, chunk_index, content, embedding)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )?;

        for stored in chunks {
            let chunk = &stored.chunk;
            stmt.execute(params![
                chunk.id(),
                chunk.course_title,
                chunk.lesson_number,
                chunk.chunk_index as i64,
                chunk.content,
                Self::embedding_to_bytes(&stored.embedding),
            ])?;
        }
        Ok(())
    }

    fn course_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(Course, Vec<u8>)> {
        let lessons_json: String = row.get(3)?;
        let lessons: Vec<Lesson> = serde_json::from_str(&lessons_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;

        let course = Course {
            title: row.get(0)?,
            instructor: row.get(1)?,
            link: row.get(2)?,
            lessons,
        };
        Ok((course, row.get(4)?))
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, course, title_embedding), fields(course = %course.title))]
    async fn upsert_course(&self, course: &Course, title_embedding: &[f32]) -> Result<()> {
        let conn = self.lock()?;
        let lessons_json = serde_json::to_string(&course.lessons)?;

        conn.execute(
            r#"
            INSERT OR REPLACE INTO courses (title, instructor, link, lessons_json, embedding)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                course.title,
                course.instructor,
                course.link,
                lessons_json,
                Self::embedding_to_bytes(title_embedding),
            ],
        )?;

        debug!("Upserted course metadata");
        Ok(())
    }

    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    async fn upsert_chunks(&self, chunks: &[StoredChunk]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        Self::insert_chunks(&tx, chunks)?;
        tx.commit()?;

        info!("Upserted {} chunks", chunks.len());
        Ok(chunks.len())
    }

    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    async fn replace_course_chunks(&self, course_title: &str, chunks: &[StoredChunk]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let removed = tx.execute("DELETE FROM chunks WHERE course_title = ?1", params![course_title])?;
        Self::insert_chunks(&tx, chunks)?;
        tx.commit()?;

        info!("Replaced {} chunks with {}", removed, chunks.len());
        Ok(chunks.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search_content(
        &self,
        query_embedding: &[f32],
        filter: &SearchFilter,
        limit: usize,
    ) -> Result<Vec<ChunkMatch>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT course_title, lesson_number, chunk_index, content, embedding
            FROM chunks
            WHERE (?1 IS NULL OR course_title = ?1)
              AND (?2 IS NULL OR lesson_number = ?2)
            "#,
        )?;

        let rows = stmt.query_map(params![filter.course_title, filter.lesson_number], |row| {
            let chunk_index: i64 = row.get(2)?;
            let embedding: Vec<u8> = row.get(4)?;
            Ok((
                CourseChunk {
                    course_title: row.get(0)?,
                    lesson_number: row.get(1)?,
                    chunk_index: chunk_index as usize,
                    content: row.get(3)?,
                },
                embedding,
            ))
        })?;

        let mut scored = Vec::new();
        for row in rows {
            let (chunk, bytes) = row?;
            let score = cosine_similarity(query_embedding, &Self::bytes_to_embedding(&bytes));
            scored.push((score, chunk));
        }

        let results: Vec<ChunkMatch> = rank(scored, limit)
            .into_iter()
            .map(|(score, chunk)| ChunkMatch { chunk, score })
            .collect();

        debug!("Found {} matching chunks", results.len());
        Ok(results)
    }

    #[instrument(skip(self, query_embedding))]
    async fn search_catalog(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<CourseMatch>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT title, instructor, link, lessons_json, embedding FROM courses")?;

        let mut scored = Vec::new();
        for row in stmt.query_map([], Self::course_from_row)? {
            let (course, bytes) = row?;
            let score = cosine_similarity(query_embedding, &Self::bytes_to_embedding(&bytes));
            scored.push((score, course));
        }

        Ok(rank(scored, limit)
            .into_iter()
            .map(|(score, course)| CourseMatch { course, score })
            .collect())
    }

    async fn course_titles(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT title FROM courses ORDER BY title")?;
        let titles = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(titles)
    }

    async fn course_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM courses", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    #[instrument(skip(self))]
    async fn get_course(&self, title: &str) -> Result<Option<Course>> {
        let conn = self.lock()?;
        let course = conn
            .query_row(
                "SELECT title, instructor, link, lessons_json, embedding FROM courses WHERE title = ?1",
                params![title],
                Self::course_from_row,
            )
            .optional()?;
        Ok(course.map(|(course, _)| course))
    }

    async fn all_courses(&self) -> Result<Vec<Course>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT title, instructor, link, lessons_json, embedding FROM courses ORDER BY title",
        )?;
        let courses = stmt
            .query_map([], Self::course_from_row)?
            .map(|row| row.map(|(course, _)| course))
            .collect::<rusqlite::Result<Vec<Course>>>()?;
        Ok(courses)
    }

    async fn chunk_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    async fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch("DELETE FROM chunks; DELETE FROM courses;")?;
        info!("Cleared vector store");
        Ok(())
    }
}

//! Lectern - a course materials assistant
//!
//! Indexes structured course documents into a local vector store and answers
//! questions about them with an LLM that decides when to search the lessons.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `course` - Course, lesson, chunk and source types
//! - `document` - Course document parsing and sentence-aware chunking
//! - `embedding` - Embedding generation
//! - `vector_store` - Course catalog and chunk storage with similarity search
//! - `llm` - Chat model abstraction and OpenAI backend
//! - `tools` - Tools the model can call (content search, course outline)
//! - `rag` - Retrieval, generation loop and session history
//! - `orchestrator` - `RagSystem`, tying everything together
//! - `cli` - Command-line front end and HTTP server
//!
//! # Example
//!
//! ```rust,no_run
//! use lectern::config::Settings;
//! use lectern::orchestrator::RagSystem;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let rag = RagSystem::new(settings)?;
//!
//!     rag.add_course_folder(std::path::Path::new("docs"), false).await?;
//!     let answer = rag.query("What is covered in lesson 1 of the MCP course?", None).await?;
//!     println!("{}", answer.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod course;
pub mod document;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod tools;
pub mod vector_store;

#[cfg(test)]
mod test_support;

pub use error::{LecternError, Result};

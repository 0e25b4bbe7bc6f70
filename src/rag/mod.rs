//! Retrieval-augmented answering over the course catalog.

mod generator;
mod retriever;
mod session;

pub use generator::{AiGenerator, Generation};
pub use retriever::CourseRetriever;
pub use session::{Message, Role, SessionManager};

//! Bounded per-session conversation history.

use crate::error::{LecternError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    fn label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// In-process conversation store keeping the last `max_history` exchanges
/// of each session.
///
/// Sessions are never evicted. Any id seen by [`SessionManager::add_message`]
/// stays in memory until [`SessionManager::clear_session`] or process exit,
/// so the store suits a single-user deployment.
pub struct SessionManager {
    max_history: usize,
    sessions: Mutex<HashMap<String, Vec<Message>>>,
}

impl SessionManager {
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn sessions(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<Message>>>> {
        self.sessions
            .lock()
            .map_err(|e| LecternError::Session(format!("Failed to acquire lock: {}", e)))
    }

    /// Start a new empty session and return its id.
    pub fn create_session(&self) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.sessions()?.insert(id.clone(), Vec::new());
        debug!(session_id = %id, "Created session");
        Ok(id)
    }

    /// Append a message, creating the session if it does not exist.
    pub fn add_message(&self, session_id: &str, role: Role, content: &str) -> Result<()> {
        let limit = self.max_history * 2;
        let mut sessions = self.sessions()?;
        let history = sessions.entry(session_id.to_string()).or_default();
        history.push(Message {
            role,
            content: content.to_string(),
        });
        if history.len() > limit {
            let excess = history.len() - limit;
            history.drain(..excess);
        }
        Ok(())
    }

    /// Record one question/answer exchange.
    pub fn add_exchange(&self, session_id: &str, user: &str, assistant: &str) -> Result<()> {
        self.add_message(session_id, Role::User, user)?;
        self.add_message(session_id, Role::Assistant, assistant)
    }

    pub fn history(&self, session_id: &str) -> Result<Vec<Message>> {
        Ok(self.sessions()?.get(session_id).cloned().unwrap_or_default())
    }

    /// History rendered as `User: ...` / `Assistant: ...` lines, or `None`
    /// when the session is unknown or empty.
    pub fn formatted_history(&self, session_id: &str) -> Result<Option<String>> {
        let history = self.history(session_id)?;
        if history.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            history
                .iter()
                .map(|m| format!("{}: {}", m.role.label(), m.content))
                .collect::<Vec<_>>()
                .join("\n"),
        ))
    }

    /// Drop a session's history. Returns whether the session existed.
    pub fn clear_session(&self, session_id: &str) -> Result<bool> {
        Ok(self.sessions()?.remove(session_id).is_some())
    }

    pub fn session_count(&self) -> Result<usize> {
        Ok(self.sessions()?.len())
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(2)
    }
}

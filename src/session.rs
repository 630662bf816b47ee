use crate::error::{AppError, AppResult};
use crate::user_models::{Role, UserSummary};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

/// The authenticated user a domain call acts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub display_name: String,
    pub role: Role,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            role: self.role,
        }
    }
}

/// Bearer tokens handed out by the server. Lives only in process memory.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, session: Session) -> String {
        let token = Uuid::new_v4().to_string();
        self.sessions.write().insert(token.clone(), session);
        token
    }

    pub fn get(&self, token: &str) -> Option<Session> {
        self.sessions.read().get(token).cloned()
    }

    pub fn close(&self, token: &str) -> bool {
        self.sessions.write().remove(token).is_some()
    }
}

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use songboard::cache::{ManualClock, DEFAULT_TTL};
use songboard::remote::MemoryFileStore;
use songboard::user_models::Role;
use songboard::{Repository, Session};
use std::sync::Arc;

pub struct Harness {
    pub store: Arc<MemoryFileStore>,
    pub clock: Arc<ManualClock>,
    pub repo: Arc<Repository>,
}

/// Repository over an empty in-memory store, clock frozen at 2025-04-01 12:00 UTC.
pub fn harness() -> Harness {
    let store = Arc::new(MemoryFileStore::new());
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 4, 1, 12, 0, 0).unwrap(),
    ));
    let repo = Arc::new(Repository::new(store.clone(), DEFAULT_TTL, clock.clone()));

    Harness { store, clock, repo }
}

pub fn member(username: &str, display_name: &str) -> Session {
    Session {
        username: username.to_string(),
        display_name: display_name.to_string(),
        role: Role::Member,
    }
}

pub fn admin() -> Session {
    Session {
        username: "admin".to_string(),
        display_name: "Administrador".to_string(),
        role: Role::Admin,
    }
}

use crate::cache::{Clock, TtlCache};
use crate::codec::FlatFile;
use crate::error::StoreError;
use crate::models::{SongTable, VoteTable};
use crate::remote::FileStore;
use crate::user_models::UserTable;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

/// Cached read-modify-write access to the three data files.
///
/// Each collection has one cache slot. A successful save clears that slot so
/// the next load fetches the new version and its token.
///
/// Callers that load, modify and save hold [`Repository::write_lock`] for the
/// whole cycle, so requests in one process never race each other's tokens.
pub struct Repository {
    store: Arc<dyn FileStore>,
    clock: Arc<dyn Clock>,
    writer: Mutex<()>,
    users: TtlCache<UserTable>,
    songs: TtlCache<SongTable>,
    votes: TtlCache<VoteTable>,
}

impl Repository {
    pub fn new(store: Arc<dyn FileStore>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            users: TtlCache::new(ttl, clock.clone()),
            songs: TtlCache::new(ttl, clock.clone()),
            votes: TtlCache::new(ttl, clock.clone()),
            clock,
            writer: Mutex::new(()),
        }
    }

    /// Serializes read-modify-write cycles within this process.
    pub async fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().await
    }

    pub async fn load_users(&self) -> Result<UserTable, StoreError> {
        self.load(&self.users).await
    }

    pub async fn save_users(&self, users: &UserTable) -> Result<(), StoreError> {
        self.save(&self.users, users).await
    }

    pub async fn load_songs(&self) -> Result<SongTable, StoreError> {
        self.load(&self.songs).await
    }

    pub async fn save_songs(&self, songs: &SongTable) -> Result<(), StoreError> {
        self.save(&self.songs, songs).await
    }

    pub async fn load_votes(&self) -> Result<VoteTable, StoreError> {
        self.load(&self.votes).await
    }

    pub async fn save_votes(&self, votes: &VoteTable) -> Result<(), StoreError> {
        self.save(&self.votes, votes).await
    }

    /// Today's date according to the injected clock. The system clock
    /// answers in the server's local time zone.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    async fn load<T: FlatFile>(&self, cache: &TtlCache<T>) -> Result<T, StoreError> {
        if let Some(value) = cache.fresh() {
            debug!(path = T::PATH, "Serving from cache");
            return Ok(value);
        }

        let Some(file) = self.store.get(T::PATH).await? else {
            return Ok(self.bootstrap(cache).await);
        };

        let value = match T::decode(&file.content) {
            Ok(value) => value,
            Err(e) => {
                error!(path = T::PATH, error = %e, "Failed to decode, using an empty collection");
                T::empty()
            }
        };

        cache.store(value.clone(), Some(file.token));
        Ok(value)
    }

    async fn bootstrap<T: FlatFile>(&self, cache: &TtlCache<T>) -> T {
        let value = T::bootstrap();
        info!(path = T::PATH, "File missing, writing default contents");

        let written = match value.encode() {
            Ok(content) => {
                let message = format!("Create {}", T::PATH);
                self.store.put(T::PATH, &content, None, &message).await
            }
            Err(source) => Err(StoreError::Codec {
                path: T::PATH.to_string(),
                source,
            }),
        };

        match written {
            Ok(token) => cache.store(value.clone(), Some(token)),
            Err(e) => warn!(path = T::PATH, error = %e, "Could not persist default contents"),
        }

        value
    }

    async fn save<T: FlatFile>(&self, cache: &TtlCache<T>, value: &T) -> Result<(), StoreError> {
        let content = value.encode().map_err(|source| StoreError::Codec {
            path: T::PATH.to_string(),
            source,
        })?;

        let token = cache.token();
        let message = format!("Update {}", T::PATH);

        match self
            .store
            .put(T::PATH, &content, token.as_deref(), &message)
            .await
        {
            Ok(_) => {
                cache.invalidate();
                Ok(())
            }
            Err(e) => {
                warn!(path = T::PATH, error = %e, "Save failed");
                Err(e)
            }
        }
    }
}

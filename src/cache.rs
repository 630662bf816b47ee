//! Time-boxed cache slot for a single collection.

use chrono::{DateTime, Local, NaiveDate, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date stamped on new records.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(by) = chrono::Duration::from_std(by) {
            *self.now.lock() += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

struct Slot<T> {
    value: T,
    token: Option<String>,
    stored_at: DateTime<Utc>,
}

/// Value, concurrency token and timestamp of the last load.
///
/// The token outlives freshness: a stale slot still tells `save` which
/// version it last saw.
pub struct TtlCache<T> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    slot: Mutex<Option<Slot<T>>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            slot: Mutex::new(None),
        }
    }

    /// The cached value if it is younger than the TTL.
    pub fn fresh(&self) -> Option<T> {
        let slot = self.slot.lock();
        let slot = slot.as_ref()?;

        let age = self.clock.now().signed_duration_since(slot.stored_at);
        let age = age.to_std().unwrap_or(Duration::ZERO);
        (age < self.ttl).then(|| slot.value.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.slot.lock().as_ref().and_then(|slot| slot.token.clone())
    }

    pub fn store(&self, value: T, token: Option<String>) {
        *self.slot.lock() = Some(Slot {
            value,
            token,
            stored_at: self.clock.now(),
        });
    }

    pub fn invalidate(&self) {
        *self.slot.lock() = None;
    }

    pub fn is_empty(&self) -> bool {
        self.slot.lock().is_none()
    }
}

//! Session storage
//!
//! Sessions live in a concurrent map shared by every connection task. A
//! background sweeper removes entries whose expiry has passed.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

/// Cookie that carries the session identifier.
pub const SESSION_KEY_ID: &str = "session_id";

/// Shortest sweep period; a zero period is raised to this.
pub const MIN_SWEEP_PERIOD: Duration = Duration::from_millis(1);

/// Default session time-to-live: ten minutes.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_millis(10 * 60 * 1000);

type Attribute = Arc<dyn Any + Send + Sync>;

/// Server-side state bag for one client.
///
/// The identifier and expiry are reserved fields owned by the dispatcher and
/// the sweeper; everything else is application data stored by pages.
pub struct Session {
    id: u64,
    expires_at: Mutex<Instant>,
    attributes: Mutex<HashMap<String, Attribute>>,
}

impl Session {
    fn new(id: u64, expires_at: Instant) -> Self {
        Self {
            id,
            expires_at: Mutex::new(expires_at),
            attributes: Mutex::new(HashMap::new()),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn expires_at(&self) -> Instant {
        *self.expires_at.lock()
    }

    /// True once `now` has passed the expiry.
    pub fn is_expired(&self, now: Instant) -> bool {
        now > *self.expires_at.lock()
    }

    /// Pushes the expiry to `now + ttl`.
    pub fn renew(&self, now: Instant, ttl: Duration) {
        *self.expires_at.lock() = now + ttl;
    }

    /// Stores an attribute, returning whether a previous value was replaced.
    pub fn insert<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) -> bool {
        self.attributes
            .lock()
            .insert(key.into(), Arc::new(value))
            .is_some()
    }

    /// Returns a clone of the attribute if it exists and has type `T`.
    pub fn get<T: Any + Clone>(&self, key: &str) -> Option<T> {
        self.attributes
            .lock()
            .get(key)
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.attributes.lock().contains_key(key)
    }

    pub fn remove(&self, key: &str) -> bool {
        self.attributes.lock().remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.attributes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.lock().is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.attributes.lock().keys().cloned().collect()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("expires_at", &self.expires_at())
            .field("attributes", &self.keys())
            .finish()
    }
}

/// Result of resolving a request's session cookie.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub session: Arc<Session>,
    /// True when the session was not live and got a fresh attribute bag.
    pub created: bool,
}

/// Concurrent map from session identifier to [`Session`].
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<String, Arc<Session>>,
    next_id: AtomicU64,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            next_id: AtomicU64::new(0),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn resolve(&self, cookie: Option<&str>) -> Resolved {
        self.resolve_at(cookie, Instant::now())
    }

    /// Finds or creates the session for a cookie value at time `now`.
    ///
    /// - live session: reused and renewed to `now + ttl`
    /// - expired session still in the map: replaced by an empty bag with the
    ///   same identifier
    /// - anything else: a new identifier is allocated
    ///
    /// The check-then-renew sequence is not fenced against the sweeper; a
    /// sweep that already judged the entry expired may still remove it.
    pub fn resolve_at(&self, cookie: Option<&str>, now: Instant) -> Resolved {
        if let Some(existing) = cookie.and_then(|id| self.get(id)) {
            if !existing.is_expired(now) {
                existing.renew(now, self.ttl);
                return Resolved {
                    session: existing,
                    created: false,
                };
            }

            let fresh = Arc::new(Session::new(existing.id, now + self.ttl));
            self.sessions
                .insert(existing.id.to_string(), Arc::clone(&fresh));
            tracing::debug!(session = existing.id, "Expired session replaced");
            return Resolved {
                session: fresh,
                created: true,
            };
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let session = Arc::new(Session::new(id, now + self.ttl));
        self.sessions.insert(id.to_string(), Arc::clone(&session));
        tracing::trace!(session = id, "New session created");
        Resolved {
            session,
            created: true,
        }
    }

    /// Removes every session that has expired at `now`. Returns the number
    /// removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let keys: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();

        let removed = keys
            .iter()
            .filter(|key| {
                self.sessions
                    .remove_if(*key, |_, session| session.is_expired(now))
                    .is_some()
            })
            .count();

        if removed > 0 {
            tracing::debug!(removed, remaining = self.sessions.len(), "Removed expired sessions");
        }
        removed
    }

    /// Starts the background sweeper, running every `period`.
    ///
    /// The task holds only a weak reference and stops once the store is
    /// dropped. A period below [`MIN_SWEEP_PERIOD`] is raised to it.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let period = if period < MIN_SWEEP_PERIOD {
            tracing::warn!(?period, "Sweep period too short, using minimum");
            MIN_SWEEP_PERIOD
        } else {
            period
        };
        let store: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                match store.upgrade() {
                    Some(store) => {
                        store.sweep(Instant::now());
                    }
                    None => break,
                }
            }
            tracing::trace!("Session sweeper stopped");
        })
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

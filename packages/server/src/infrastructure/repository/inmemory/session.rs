//! InMemory SessionStore implementation
//!
//! Sessions and their location sets live in two `HashMap`s guarded by a single
//! mutex. The lock is held for one lookup or mutation at a time and never
//! across an `.await` on anything other than the lock itself.
//!
//! Every session and every location carries its own last-access timestamp.
//! Reads and writes touching a session refresh the session's timestamp.
//! A location's timestamp is refreshed when it is written and when the whole
//! set is read through `get_all_locations`. The sweeper (see
//! [`ExpirySweeper`](super::ExpirySweeper)) evicts whatever has been idle
//! longer than the TTL.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Clock, Location, ParticipantId, Session, SessionId, SessionStore, StoreError, SystemClock,
    Timestamp,
};

/// Default idle time after which a session or location is evicted
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct SessionEntry {
    session: Session,
    last_access: Timestamp,
}

struct LocationEntry {
    location: Location,
    last_access: Timestamp,
}

#[derive(Default)]
struct StoreState {
    sessions: HashMap<SessionId, SessionEntry>,
    locations: HashMap<SessionId, HashMap<ParticipantId, LocationEntry>>,
}

/// Outcome of one sweep pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub sessions_removed: usize,
    pub locations_removed: usize,
}

/// In-memory SessionStore
pub struct InMemorySessionStore {
    state: Mutex<StoreState>,
    ttl_millis: i64,
    clock: Arc<dyn Clock>,
}

impl InMemorySessionStore {
    /// Create a store using the wall clock
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Create a store reading time from `clock`
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            ttl_millis: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
            clock,
        }
    }

    /// Number of sessions currently held
    pub async fn session_count(&self) -> usize {
        self.state.lock().await.sessions.len()
    }

    /// Evict everything idle for longer than the TTL.
    ///
    /// A session whose own last access is too old is removed together with its
    /// location set. For the remaining sessions, stale locations are removed
    /// one by one, and a session left without any location is removed too.
    pub async fn sweep_expired(&self) -> SweepReport {
        let now = self.clock.now();
        let ttl = self.ttl_millis;
        let mut report = SweepReport::default();

        let mut state = self.state.lock().await;
        let StoreState {
            sessions,
            locations,
        } = &mut *state;

        sessions.retain(|session_id, entry| {
            if now.millis_since(entry.last_access) > ttl {
                report.sessions_removed += 1;
                if let Some(removed) = locations.remove(session_id) {
                    report.locations_removed += removed.len();
                }
                false
            } else {
                true
            }
        });

        locations.retain(|session_id, location_set| {
            let before = location_set.len();
            location_set.retain(|_, entry| now.millis_since(entry.last_access) <= ttl);
            report.locations_removed += before - location_set.len();

            if location_set.is_empty() {
                if sessions.remove(session_id).is_some() {
                    report.sessions_removed += 1;
                }
                false
            } else {
                if let Some(entry) = sessions.get_mut(session_id) {
                    entry.session.participant_count = location_set.len();
                }
                true
            }
        });

        report
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create_session(
        &self,
        session_id: &SessionId,
        initial_location: Location,
    ) -> Result<(), StoreError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        state.sessions.insert(
            session_id.clone(),
            SessionEntry {
                session: Session::new(session_id.clone(), now, self.ttl_millis),
                last_access: now,
            },
        );

        let mut location_set = HashMap::new();
        location_set.insert(
            initial_location.participant_id.clone(),
            LocationEntry {
                location: initial_location,
                last_access: now,
            },
        );
        state.locations.insert(session_id.clone(), location_set);

        Ok(())
    }

    async fn get_session(&self, session_id: &SessionId) -> Result<Session, StoreError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        let entry = state
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| StoreError::NotFound(session_id.clone()))?;
        entry.last_access = now;
        entry.session.touch(now, self.ttl_millis);

        Ok(entry.session.clone())
    }

    async fn session_exists(&self, session_id: &SessionId) -> bool {
        self.state.lock().await.sessions.contains_key(session_id)
    }

    async fn update_location(
        &self,
        session_id: &SessionId,
        location: Location,
    ) -> Result<(), StoreError> {
        let now = self.clock.now();
        let ttl = self.ttl_millis;
        let mut state = self.state.lock().await;
        let StoreState {
            sessions,
            locations,
        } = &mut *state;

        let location_set = locations.entry(session_id.clone()).or_default();
        location_set.insert(
            location.participant_id.clone(),
            LocationEntry {
                location,
                last_access: now,
            },
        );
        let participant_count = location_set.len();

        // Writes for an unknown session materialize it
        let entry = sessions
            .entry(session_id.clone())
            .or_insert_with(|| SessionEntry {
                session: Session::new(session_id.clone(), now, ttl),
                last_access: now,
            });
        entry.last_access = now;
        entry.session.touch(now, ttl);
        entry.session.participant_count = participant_count;

        Ok(())
    }

    async fn get_all_locations(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<Location>, StoreError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        let StoreState {
            sessions,
            locations,
        } = &mut *state;

        let entry = sessions
            .get_mut(session_id)
            .ok_or_else(|| StoreError::NotFound(session_id.clone()))?;
        entry.last_access = now;
        entry.session.touch(now, self.ttl_millis);

        // Reading the set counts as access for every location in it
        let mut all_locations: Vec<Location> = locations
            .get_mut(session_id)
            .map(|set| {
                set.values_mut()
                    .map(|entry| {
                        entry.last_access = now;
                        entry.location.clone()
                    })
                    .collect()
            })
            .unwrap_or_default();

        // Sort by participant id for consistent ordering
        all_locations.sort_by(|a, b| a.participant_id.cmp(&b.participant_id));

        Ok(all_locations)
    }
}

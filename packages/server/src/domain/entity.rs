//! Core domain models for location sharing.

use super::value_object::{Coordinates, ParticipantId, SessionId, Timestamp};

/// Latest known position of one participant in a session
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    /// Participant identifier (scoped to the session)
    pub participant_id: ParticipantId,
    /// Position in decimal degrees
    pub coordinates: Coordinates,
    /// Capture time reported by the client (epoch milliseconds)
    pub timestamp: Timestamp,
}

impl Location {
    /// Create a new location
    pub fn new(
        participant_id: ParticipantId,
        coordinates: Coordinates,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            participant_id,
            coordinates,
            timestamp,
        }
    }
}

/// Snapshot of a session's metadata.
///
/// The authoritative record lives inside the store; values of this type are
/// copies handed out to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Session identifier
    pub id: SessionId,
    /// Timestamp when the session was created
    pub created_at: Timestamp,
    /// Sliding expiration, pushed forward on every touch
    pub expires_at: Timestamp,
    /// Number of participants with a known location (informational)
    pub participant_count: usize,
}

impl Session {
    /// Create a new session record that expires `ttl_millis` after `now`
    pub fn new(id: SessionId, now: Timestamp, ttl_millis: i64) -> Self {
        Self {
            id,
            created_at: now,
            expires_at: now.add_millis(ttl_millis),
            participant_count: 1,
        }
    }

    /// Slide the expiration forward to `now + ttl_millis`.
    ///
    /// Expiration never moves backward, even if the clock does.
    pub fn touch(&mut self, now: Timestamp, ttl_millis: i64) {
        let candidate = now.add_millis(ttl_millis);
        if candidate > self.expires_at {
            self.expires_at = candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::factory::SessionIdFactory;

    #[test]
    fn test_session_new() {
        // テスト項目: a new session starts with one participant and expires after the TTL
        // given (前提条件):
        let id = SessionIdFactory::generate();

        // when (操作):
        let session = Session::new(id.clone(), Timestamp::new(1_000), 500);

        // then (期待する結果):
        assert_eq!(session.id, id);
        assert_eq!(session.created_at, Timestamp::new(1_000));
        assert_eq!(session.expires_at, Timestamp::new(1_500));
        assert_eq!(session.participant_count, 1);
    }

    #[test]
    fn test_session_touch_slides_forward() {
        // テスト項目: touching a session slides its expiration forward
        // given (前提条件):
        let mut session = Session::new(SessionIdFactory::generate(), Timestamp::new(1_000), 500);

        // when (操作):
        session.touch(Timestamp::new(1_200), 500);

        // then (期待する結果):
        assert_eq!(session.expires_at, Timestamp::new(1_700));
        assert_eq!(session.created_at, Timestamp::new(1_000));
    }

    #[test]
    fn test_session_touch_never_moves_backward() {
        // テスト項目: a touch with an earlier clock reading keeps the later expiration
        // given (前提条件):
        let mut session = Session::new(SessionIdFactory::generate(), Timestamp::new(1_000), 500);

        // when (操作):
        session.touch(Timestamp::new(900), 500);

        // then (期待する結果):
        assert_eq!(session.expires_at, Timestamp::new(1_500));
    }
}

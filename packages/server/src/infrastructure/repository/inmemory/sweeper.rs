//! Periodic TTL eviction for [`InMemorySessionStore`].

use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use tokio::{
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

use super::InMemorySessionStore;

/// Default interval between two sweep passes
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Background task running [`InMemorySessionStore::sweep_expired`] on a fixed interval.
///
/// The task only holds a weak reference and stops on its own once the store
/// is dropped. Dropping the sweeper aborts the task.
pub struct ExpirySweeper {
    handle: JoinHandle<()>,
}

impl ExpirySweeper {
    /// Spawn the sweeper on the current tokio runtime
    pub fn spawn(store: &Arc<InMemorySessionStore>, every: Duration) -> Self {
        let store = Arc::downgrade(store);
        let handle = tokio::spawn(run(store, every));
        tracing::info!(interval_secs = every.as_secs(), "Expiry sweeper started");
        Self { handle }
    }

    /// Stop sweeping
    pub fn shutdown(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run(store: Weak<InMemorySessionStore>, every: Duration) {
    let mut ticker = time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let Some(store) = store.upgrade() else {
            tracing::debug!("Store dropped, expiry sweeper exiting");
            break;
        };

        let report = store.sweep_expired().await;
        if report.sessions_removed > 0 || report.locations_removed > 0 {
            tracing::info!(
                sessions_removed = report.sessions_removed,
                locations_removed = report.locations_removed,
                "Expired sessions swept"
            );
        } else {
            tracing::debug!("Expiry sweep found nothing to evict");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Coordinates, Location, ManualClock, ParticipantId, SessionId, SessionStore, Timestamp,
    };

    const EVERY: Duration = Duration::from_secs(3600);

    fn location(participant: &str) -> Location {
        Location::new(
            ParticipantId::new(participant.to_string()).unwrap(),
            Coordinates::new(1.0, 2.0).unwrap(),
            Timestamp::new(0),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_on_tick() {
        // テスト項目: an idle session is gone after the next tick
        // given (前提条件):
        let clock = ManualClock::new(Timestamp::new(0));
        let store = Arc::new(InMemorySessionStore::with_clock(
            Duration::from_secs(60),
            Arc::new(clock.clone()),
        ));
        let id = SessionId::new("S1".to_string()).unwrap();
        store.create_session(&id, location("alice")).await.unwrap();
        let _sweeper = ExpirySweeper::spawn(&store, EVERY);

        // when (操作):
        clock.advance(61_000);
        time::sleep(EVERY + Duration::from_millis(1)).await;

        // then (期待する結果):
        assert!(!store.session_exists(&id).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_leaves_fresh_sessions_alone() {
        // テスト項目: sessions within the TTL survive a tick
        // given (前提条件):
        let clock = ManualClock::new(Timestamp::new(0));
        let store = Arc::new(InMemorySessionStore::with_clock(
            Duration::from_secs(60),
            Arc::new(clock.clone()),
        ));
        let id = SessionId::new("S1".to_string()).unwrap();
        store.create_session(&id, location("alice")).await.unwrap();
        let _sweeper = ExpirySweeper::spawn(&store, EVERY);

        // when (操作):
        clock.advance(30_000);
        time::sleep(EVERY + Duration::from_millis(1)).await;

        // then (期待する結果):
        assert!(store.session_exists(&id).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_stops_when_store_dropped() {
        // テスト項目: the task exits once the store is gone
        // given (前提条件):
        let store = Arc::new(InMemorySessionStore::default());
        let sweeper = ExpirySweeper::spawn(&store, EVERY);

        // when (操作):
        drop(store);
        time::sleep(EVERY + Duration::from_millis(1)).await;
        tokio::task::yield_now().await;

        // then (期待する結果):
        assert!(sweeper.is_finished());
    }
}

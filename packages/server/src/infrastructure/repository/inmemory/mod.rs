//! In-memory SessionStore backed by `HashMap`s behind one mutex.

mod session;
mod sweeper;

pub use session::{DEFAULT_SESSION_TTL, InMemorySessionStore, SweepReport};
pub use sweeper::{DEFAULT_SWEEP_INTERVAL, ExpirySweeper};

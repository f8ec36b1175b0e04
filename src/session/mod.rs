//! Client sessions
//!
//! Sessions are keyed by the `session_id` cookie and expire a fixed TTL after
//! their last access.

pub mod store;

pub use store::{
    Resolved, Session, SessionStore, DEFAULT_SESSION_TTL, MIN_SWEEP_PERIOD, SESSION_KEY_ID,
};

//! Signed-in session state machine.
//!
//! [`SessionManager`] moves a [`Session`] between the
//! [`SessionState`]s in response to login, logout, registration, startup
//! and token rejection. What survives a restart is the
//! [`PersistedSession`], produced by [`to_persisted`] and read back by
//! [`from_persisted`].

mod inflight;
mod manager;
mod navigator;
mod persist;
mod state;

pub use manager::{LOGIN_FAILED_MESSAGE, REGISTER_FAILED_MESSAGE, SessionManager};
pub use navigator::{NavigationTarget, Navigator, NoopNavigator};
pub use persist::{PersistedSession, from_persisted, to_persisted};
pub use state::{Session, SessionState};

/// Tracing target for session transitions.
pub const TRACING_TARGET: &str = "leadgenie_client::session";

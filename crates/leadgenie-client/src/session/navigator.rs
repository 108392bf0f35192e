//! Navigation requests emitted by session transitions.

use super::TRACING_TARGET;

/// Surface the user should be sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationTarget {
    /// Public landing page, after an explicit logout.
    Landing,
    /// Login page, after the backend rejected the session.
    Login,
}

impl NavigationTarget {
    /// Route of the target.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Landing => "/",
            Self::Login => "/login",
        }
    }
}

/// Receives navigation requests from the session manager.
pub trait Navigator: Send + Sync {
    /// Performs a hard navigation to `target`.
    fn navigate(&self, target: NavigationTarget);
}

/// [`Navigator`] for surfaces without routes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&self, target: NavigationTarget) {
        tracing::debug!(
            target: TRACING_TARGET,
            path = target.path(),
            "Navigation requested"
        );
    }
}

//! Tracks metadata for a loading/rendering session.

use crate::log;

/// Metadata for a loading/rendering session.
///
/// A [`crate::Document`] keeps the session it was parsed with, and every render pass
/// over that document logs through it.
#[derive(Clone, Debug)]
pub struct Session {
    log_enabled: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            log_enabled: log::log_enabled(),
        }
    }

    pub fn new_for_test_suite() -> Self {
        Self { log_enabled: false }
    }

    /// Creates a session with logging forced on or off, regardless of the environment.
    pub fn with_logging(log_enabled: bool) -> Self {
        Self { log_enabled }
    }

    pub fn log_enabled(&self) -> bool {
        self.log_enabled
    }
}

use core::fmt;

/// The control surface's session state machine.
///
/// `Uninitialized -> Initialized` on `init`; `Initialized -> Running` on
/// `start`; `Running -> Initialized` on `stop`; any state returns to
/// `Uninitialized` on `cleanup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initialized,
    Running,
}

impl SessionState {
    pub fn name(self) -> &'static str {
        match self {
            SessionState::Uninitialized => "Uninitialized",
            SessionState::Initialized => "Initialized",
            SessionState::Running => "Running",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

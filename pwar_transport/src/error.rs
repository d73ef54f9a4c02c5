use thiserror::Error;

/// Errors returned by the control surface. The real-time audio and
/// receiver paths never surface this type — there is no caller inside a
/// host audio callback able to act on an `Err`, so failures there degrade
/// to silence plus a recorded underrun instead (see
/// [`pwar_core::LatencyManager::report_underrun`]).
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] pwar_core::ConfigError),

    #[error("operation requires state {expected}, session was {actual}")]
    WrongState {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("platform error: {0}")]
    Platform(#[from] pwar_platform::PlatformError),
}

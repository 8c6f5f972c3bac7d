//! Error handling for the barista simulation
//!
//! One top-level error type for every refused operation. Nothing in the
//! simulation core panics; callers get a `SimResult` or a `bool`.

use std::error::Error as StdError;
use std::fmt;

use crate::config::ConfigError;
use crate::docking::{CaptureError, ReleaseError};
use crate::process::StageKind;
use crate::props::{PropId, Tag};

/// Main error type for the simulation
#[derive(Debug)]
pub enum SimError {
    // Process Errors
    PreconditionNotMet {
        stage: StageKind,
        reason: String,
    },
    StageAlreadyRunning {
        stage: StageKind,
    },

    // Docking Errors
    InvalidCapture(CaptureError),
    ReleaseRefused(ReleaseError),

    // Classification Errors
    IllegalTagTransition {
        prop: PropId,
        from: Tag,
        to: Tag,
    },

    // Lookup Errors
    UnknownProp {
        id: u32,
    },
    UnknownSlot {
        id: u32,
    },
    UnknownProcessor {
        id: u32,
    },
    UnknownZone {
        id: u32,
    },

    // Collaborator Errors
    MissingCollaborator {
        name: String,
    },

    // Configuration Errors
    InvalidConfig {
        field: String,
        value: String,
        reason: String,
    },

    // System Errors
    SerializationError {
        context: String,
        error: String,
    },
    Internal {
        message: String,
    },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::PreconditionNotMet { stage, reason } => {
                write!(f, "Precondition not met for {:?}: {}", stage, reason)
            }
            SimError::StageAlreadyRunning { stage } => {
                write!(f, "Stage {:?} is already running", stage)
            }

            SimError::InvalidCapture(err) => write!(f, "Invalid capture: {}", err),
            SimError::ReleaseRefused(err) => write!(f, "Release refused: {}", err),

            SimError::IllegalTagTransition { prop, from, to } => write!(
                f,
                "Illegal tag transition for prop {}: {} -> {}",
                prop.0, from, to
            ),

            SimError::UnknownProp { id } => write!(f, "Unknown prop: {}", id),
            SimError::UnknownSlot { id } => write!(f, "Unknown slot: {}", id),
            SimError::UnknownProcessor { id } => write!(f, "Unknown processor: {}", id),
            SimError::UnknownZone { id } => write!(f, "Unknown zone: {}", id),

            SimError::MissingCollaborator { name } => {
                write!(f, "Missing collaborator: {}", name)
            }

            SimError::InvalidConfig {
                field,
                value,
                reason,
            } => write!(f, "Invalid config: {} = {} ({})", field, value, reason),

            SimError::SerializationError { context, error } => {
                write!(f, "Serialization error in {}: {}", context, error)
            }
            SimError::Internal { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl StdError for SimError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            SimError::InvalidCapture(err) => Some(err),
            SimError::ReleaseRefused(err) => Some(err),
            _ => None,
        }
    }
}

/// Type alias for Results in the simulation
pub type SimResult<T> = Result<T, SimError>;

// Conversion traits for subsystem errors

impl From<CaptureError> for SimError {
    fn from(error: CaptureError) -> Self {
        SimError::InvalidCapture(error)
    }
}

impl From<ReleaseError> for SimError {
    fn from(error: ReleaseError) -> Self {
        SimError::ReleaseRefused(error)
    }
}

impl From<ConfigError> for SimError {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::Invalid {
                field,
                value,
                reason,
            } => SimError::InvalidConfig {
                field,
                value,
                reason,
            },
            other => SimError::InvalidConfig {
                field: "<file>".to_string(),
                value: String::new(),
                reason: other.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for SimError {
    fn from(error: serde_json::Error) -> Self {
        SimError::SerializationError {
            context: "json".to_string(),
            error: error.to_string(),
        }
    }
}

/// Convert Option to Result with context
pub trait OptionExt<T> {
    fn ok_or_sim<F>(self, f: F) -> SimResult<T>
    where
        F: FnOnce() -> SimError;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_sim<F>(self, f: F) -> SimResult<T>
    where
        F: FnOnce() -> SimError,
    {
        self.ok_or_else(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docking::SlotId;

    #[test]
    fn test_error_display() {
        let err = SimError::IllegalTagTransition {
            prop: PropId(3),
            from: Tag::CUP_WITH_ESPRESSO,
            to: Tag::CUP,
        };
        assert_eq!(
            err.to_string(),
            "Illegal tag transition for prop 3: CupWithEspresso -> Cup"
        );
    }

    #[test]
    fn test_capture_error_wraps() {
        let err: SimError = CaptureError::SlotOccupied { slot: SlotId(1) }.into();
        assert!(matches!(err, SimError::InvalidCapture(_)));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_option_ext() {
        let opt: Option<i32> = None;
        let result = opt.ok_or_sim(|| SimError::UnknownProp { id: 9 });
        assert!(matches!(result, Err(SimError::UnknownProp { id: 9 })));
    }
}

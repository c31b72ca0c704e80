//! Canopy Error Types with Error Codes
//!
//! Error code ranges:
//! - CANOPY-001-009: Contract violations (instrumentation misuse)
//! - CANOPY-010-019: Recording errors
//! - CANOPY-020-029: Config errors
//! - CANOPY-090-099: IO/serialization errors
//!
//! Contract violations surface to the firing caller; everything confined to
//! observation (listener faults, sink backpressure) is contained inside the
//! instrumentation layer and never reaches this enum.

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CanopyError>;

/// All error variants are part of the public API.
///
/// Implements both `thiserror::Error` for std error compatibility
/// and `miette::Diagnostic` for fancy terminal error display.
#[derive(Error, Debug, Diagnostic)]
#[diagnostic(url(docsrs))]
pub enum CanopyError {
    // ═══════════════════════════════════════════
    // CONTRACT VIOLATIONS (001-009)
    // ═══════════════════════════════════════════
    #[error("[CANOPY-001] Plan element '{domain}' fired after its destruction was announced")]
    #[diagnostic(
        code(canopy::fired_after_destroy),
        help("No plan element may fire after teardown; check the arbitration core's element lifecycle")
    )]
    FiredAfterDestroy { domain: String },

    #[error("[CANOPY-002] Emitter {emitter} is not registered")]
    #[diagnostic(
        code(canopy::unknown_emitter),
        help("Emitters are registered at construction; use the id of a live plan element")
    )]
    UnknownEmitter { emitter: String },

    #[error("[CANOPY-003] Invalid element label '{label}': {reason}")]
    #[diagnostic(
        code(canopy::invalid_label),
        help("Labels become log-domain segments; keep them to printable, non-whitespace characters")
    )]
    InvalidLabel { label: String, reason: String },

    #[error("[CANOPY-004] Cannot subscribe to emitter {emitter} after its destruction")]
    #[diagnostic(
        code(canopy::subscribe_after_destroy),
        help("The emitter's registry slot was retired; subscribe before the element is torn down")
    )]
    SubscribeAfterDestroy { emitter: String },

    // ═══════════════════════════════════════════
    // RECORDING ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[CANOPY-010] Invalid recording id '{id}': {reason}")]
    #[diagnostic(
        code(canopy::invalid_recording_id),
        help("Recording ids must be alphanumeric with hyphens/underscores only")
    )]
    InvalidRecordingId { id: String, reason: String },

    // ═══════════════════════════════════════════
    // CONFIG ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[CANOPY-020] Config error: {reason}")]
    #[diagnostic(
        code(canopy::config_error),
        help("Check ~/.config/canopy/config.toml for syntax errors")
    )]
    ConfigError { reason: String },

    // ═══════════════════════════════════════════
    // IO / SERIALIZATION ERRORS (090-099)
    // ═══════════════════════════════════════════
    #[error("[CANOPY-090] IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("[CANOPY-091] JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CanopyError {
    /// Get the error code (e.g., "CANOPY-001")
    pub fn code(&self) -> &'static str {
        match self {
            // Contract violations
            Self::FiredAfterDestroy { .. } => "CANOPY-001",
            Self::UnknownEmitter { .. } => "CANOPY-002",
            Self::InvalidLabel { .. } => "CANOPY-003",
            Self::SubscribeAfterDestroy { .. } => "CANOPY-004",
            // Recording errors
            Self::InvalidRecordingId { .. } => "CANOPY-010",
            // Config errors
            Self::ConfigError { .. } => "CANOPY-020",
            // IO/serialization errors
            Self::Io(_) => "CANOPY-090",
            Self::Json(_) => "CANOPY-091",
        }
    }

    /// Check if this error reports misuse of the instrumentation contract
    /// (as opposed to an environmental failure such as IO)
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::FiredAfterDestroy { .. }
                | Self::UnknownEmitter { .. }
                | Self::InvalidLabel { .. }
                | Self::SubscribeAfterDestroy { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fired_after_destroy_code_and_display() {
        let err = CanopyError::FiredAfterDestroy {
            domain: "agent1.walk".to_string(),
        };
        assert_eq!(err.code(), "CANOPY-001");
        let msg = err.to_string();
        assert!(msg.contains("[CANOPY-001]"));
        assert!(msg.contains("agent1.walk"));
    }

    #[test]
    fn unknown_emitter_code() {
        let err = CanopyError::UnknownEmitter {
            emitter: "deadbeef".to_string(),
        };
        assert_eq!(err.code(), "CANOPY-002");
        assert!(err.to_string().contains("deadbeef"));
    }

    #[test]
    fn invalid_label_code_and_display() {
        let err = CanopyError::InvalidLabel {
            label: "bad label".to_string(),
            reason: "whitespace".to_string(),
        };
        assert_eq!(err.code(), "CANOPY-003");
        let msg = err.to_string();
        assert!(msg.contains("[CANOPY-003]"));
        assert!(msg.contains("bad label"));
    }

    #[test]
    fn contract_violation_classification() {
        assert!(CanopyError::FiredAfterDestroy {
            domain: "a".into()
        }
        .is_contract_violation());
        assert!(CanopyError::UnknownEmitter {
            emitter: "x".into()
        }
        .is_contract_violation());
        assert!(CanopyError::SubscribeAfterDestroy {
            emitter: "x".into()
        }
        .is_contract_violation());

        let io = CanopyError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert!(!io.is_contract_violation());
        assert!(!CanopyError::ConfigError { reason: "x".into() }.is_contract_violation());
    }

    #[test]
    fn io_error_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: CanopyError = io_err.into();
        assert_eq!(err.code(), "CANOPY-090");
        assert!(err.to_string().contains("[CANOPY-090]"));
    }

    #[test]
    fn json_error_from_serde() {
        let json_err: serde_json::Result<serde_json::Value> = serde_json::from_str("{invalid");
        if let Err(e) = json_err {
            let err: CanopyError = e.into();
            assert_eq!(err.code(), "CANOPY-091");
        }
    }
}

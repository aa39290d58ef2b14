use crate::error::{DamageError, ErrorSeverity};

/// Failure reported by a collaborator call.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CollaboratorError {
    /// The service could not be reached; the same call may succeed later.
    #[error("collaborator unavailable")]
    Unavailable,

    /// The service refused the request.
    #[error("collaborator rejected request: {0}")]
    Rejected(String),
}

impl DamageError for CollaboratorError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            CollaboratorError::Unavailable => ErrorSeverity::Recoverable,
            CollaboratorError::Rejected(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            CollaboratorError::Unavailable => "collaborator_unavailable",
            CollaboratorError::Rejected(_) => "collaborator_rejected",
        }
    }
}

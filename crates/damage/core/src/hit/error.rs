use crate::error::{DamageError, ErrorSeverity};
use crate::tags::TagError;
use crate::types::ActorHandle;

/// Reasons a hit cannot become a damage event.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidEventError {
    #[error("damage amount is not finite")]
    NonFiniteAmount,

    #[error("damage type is empty")]
    EmptyDamageType,

    #[error("invalid tag: {0}")]
    InvalidTag(#[from] TagError),

    #[error("no target given and the raw hit carries no actor")]
    MissingTarget,

    #[error("target {0} is not a valid actor")]
    InvalidTarget(ActorHandle),

    #[error("raw hit geometry contains non-finite components")]
    NonFiniteHitGeometry,
}

impl DamageError for InvalidEventError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            InvalidEventError::NonFiniteAmount => "non_finite_amount",
            InvalidEventError::EmptyDamageType => "empty_damage_type",
            InvalidEventError::InvalidTag(_) => "invalid_tag",
            InvalidEventError::MissingTarget => "missing_target",
            InvalidEventError::InvalidTarget(_) => "invalid_target",
            InvalidEventError::NonFiniteHitGeometry => "non_finite_hit_geometry",
        }
    }
}

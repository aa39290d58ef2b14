//! Common error infrastructure for damage-core.
//!
//! Domain-specific errors (e.g. [`crate::hit::InvalidEventError`],
//! [`crate::rules::RuleTableError`]) live next to the code that produces them.
//! This module only provides the shared classification they all implement.

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: a collaborator may succeed on a later attempt
/// - **Validation**: invalid input, rejected without retry
/// - **Internal**: an invariant of the engine itself was violated
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Temporary condition; retrying the same step may succeed.
    ///
    /// Examples: ability runtime unreachable, physics queue full
    Recoverable,

    /// Invalid input that should not be retried without changes.
    ///
    /// Examples: non-finite damage amount, duplicate rule id
    Validation,

    /// Unexpected state inconsistency. These indicate bugs.
    ///
    /// Examples: illegal plan state transition
    Internal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// Common trait for all damage-core errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
/// - Return a stable snake_case `error_code` per variant for telemetry
pub trait DamageError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Default implementation uses the error type name.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

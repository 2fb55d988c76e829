//! Error taxonomy for the trend engine.
//!
//! Validation errors are raised before any computation and carry a
//! structured reason. External failures are surfaced to the caller with a
//! retryable flag; nothing in the engine retries on its own.

use thiserror::Error;

/// Input rejected before evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Field name is not on the queryable whitelist.
    #[error("unknown filter field '{0}'")]
    UnknownField(String),

    /// Operator cannot be applied to this field's type.
    #[error("operator '{operator}' is not supported on field '{field}'")]
    OperatorNotSupported {
        /// Field name.
        field: String,
        /// Operator name.
        operator: String,
    },

    /// Filter value does not match the field type or operator.
    #[error("invalid value for field '{field}': expected {expected}")]
    ValueTypeMismatch {
        /// Field name.
        field: String,
        /// Human-readable description of the expected value.
        expected: String,
    },

    /// `between` value is not an ordered numeric pair.
    #[error("invalid between value for field '{field}': {reason}")]
    InvalidBetween {
        /// Field name.
        field: String,
        /// Why the pair was rejected.
        reason: String,
    },

    /// `in`/`notIn` list exceeds the maximum length.
    #[error("list for field '{field}' has {len} elements, maximum is {max}")]
    ListTooLarge {
        /// Field name.
        field: String,
        /// Supplied length.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// `in`/`notIn` list is empty.
    #[error("list for field '{0}' must not be empty")]
    EmptyList(String),

    /// Query is structurally invalid (perspective without team, zero limit).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Season range with start after end.
    #[error("invalid season range {start}..={end}")]
    InvalidSeasonRange {
        /// First season.
        start: i32,
        /// Last season.
        end: i32,
    },

    /// Baseline rate outside the open interval (0, 1).
    #[error("baseline rate must be in (0, 1), got {0}")]
    InvalidBaseline(f64),

    /// Parlay with fewer than two legs.
    #[error("a parlay needs at least 2 legs, got {0}")]
    TooFewLegs(usize),

    /// Teaser with a leg count other than two.
    #[error("a teaser needs exactly 2 legs, got {0}")]
    TeaserLegCount(usize),

    /// Odds that cannot be priced.
    #[error("invalid odds: {0}")]
    InvalidOdds(String),

    /// Probability outside [0, 1] or not finite.
    #[error("probability for {context} must be in [0, 1], got {value}")]
    InvalidProbability {
        /// What the probability describes.
        context: String,
        /// Supplied value.
        value: f64,
    },

    /// Bankroll that is not strictly positive.
    #[error("bankroll must be positive, got {0}")]
    InvalidBankroll(String),

    /// Tier rule table that cannot guarantee ordered tiers.
    #[error("invalid rule table '{version}': {reason}")]
    InvalidRuleTable {
        /// Table version.
        version: String,
        /// Why the table was rejected.
        reason: String,
    },

    /// Configuration value out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Top-level error for engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input rejected before computation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A pick result was already settled.
    #[error("pick for game {game_id} already graded as {result}")]
    AlreadyGraded {
        /// Game the pick belongs to.
        game_id: String,
        /// The existing result.
        result: String,
    },

    /// Record store or rating provider failed.
    #[error("{source_name} failed: {message}")]
    External {
        /// Name of the failing collaborator.
        source_name: String,
        /// Failure description.
        message: String,
        /// Whether the caller may retry.
        retryable: bool,
    },
}

impl EngineError {
    /// Returns true if the caller may retry the operation.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::External { retryable: true, .. })
    }

    /// Returns true if this is a validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_converts_into_engine_error() {
        let err: EngineError = ValidationError::TooFewLegs(1).into();
        assert!(err.is_validation());
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "a parlay needs at least 2 legs, got 1");
    }

    #[test]
    fn external_error_reports_retryable() {
        let err = EngineError::External {
            source_name: "ratings".to_string(),
            message: "timeout".to_string(),
            retryable: true,
        };
        assert!(err.is_retryable());
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn list_too_large_message_names_limits() {
        let err = ValidationError::ListTooLarge {
            field: "team".to_string(),
            len: 51,
            max: 50,
        };
        assert!(err.to_string().contains("51"));
        assert!(err.to_string().contains("50"));
    }
}

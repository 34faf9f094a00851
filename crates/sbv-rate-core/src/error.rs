use thiserror::Error;

/// Validation and configuration errors exposed by `sbv-rate-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("date must be in format 'YYYY-MM-DD' (e.g., '2025-01-19'): '{value}'")]
    InvalidDate { value: String },

    #[error("invalid source '{value}', expected one of {expected}")]
    InvalidSource { value: String, expected: String },

    #[error("invalid policy '{value}', expected one of priority, median")]
    InvalidPolicy { value: String },

    #[error("plausibility band bounds must be positive: lower={lower}, upper={upper}")]
    NonPositiveBand { lower: String, upper: String },
    #[error("plausibility band lower bound {lower} exceeds upper bound {upper}")]
    InvertedBand { lower: String, upper: String },
    #[error("invalid plausibility band '{value}', expected standard, strict or LOW-HIGH")]
    InvalidBand { value: String },

    #[error("timeout must be greater than zero milliseconds")]
    ZeroTimeout,
    #[error("invalid value '{value}' for {name}")]
    InvalidSetting { name: &'static str, value: String },

    #[error("source list must contain at least one source")]
    EmptySourceList,
}

/// Top-level error type for resolver operations.
///
/// Only caller mistakes and missing local tooling surface here. Network
/// failures stay inside the per-source attempt reports, and "no rate found"
/// is a regular outcome rather than an error.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("missing dependency '{dependency}': {hint}")]
    MissingDependency { dependency: String, hint: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    pub fn missing_dependency(dependency: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::MissingDependency {
            dependency: dependency.into(),
            hint: hint.into(),
        }
    }
}

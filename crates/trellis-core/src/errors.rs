//! Error and diagnostic types.
//!
//! Layout, visibility, and reconciliation never fail. Anomalies there are
//! reported as [`Diagnostic`] values which are logged and recorded, while the
//! pass continues with a clamped or placeholder result. Only configuration
//! loading is fallible.

use std::time::Duration;

use thiserror::Error;

/// Top-level error type for host-facing fallible APIs.
#[derive(Debug, Error)]
pub enum TrellisError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Invalid engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Reuse pool TTL must be positive, got {ttl:?}")]
    NonPositiveTtl { ttl: Duration },

    #[error("Visible frame inset must be finite on every edge")]
    InvalidInset,

    #[cfg(feature = "serde")]
    #[error("Failed to parse engine configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A non-fatal layout or reconciliation anomaly.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Diagnostic {
    #[error("Grid span {requested} exceeds {tracks} tracks; clamped")]
    GridSpanOverflow { requested: usize, tracks: usize },

    #[error("Pager laid out under an unbounded main axis; rendering placeholder")]
    UnboundedPager,

    #[error("Child reported {reported:?} outside its constraint; clamped to {clamped:?}")]
    ConstraintViolation {
        reported: (f64, f64),
        clamped: (f64, f64),
    },

    #[error("Identity '{identity}' appeared {count} times in one pass; suffixed")]
    IdentityCollision { identity: String, count: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic::GridSpanOverflow {
            requested: 5,
            tracks: 3,
        };
        assert_eq!(d.to_string(), "Grid span 5 exceeds 3 tracks; clamped");
    }

    #[test]
    fn test_config_error_wraps() {
        let err: TrellisError = ConfigError::InvalidInset.into();
        assert_eq!(err.to_string(), "Visible frame inset must be finite on every edge");
    }
}

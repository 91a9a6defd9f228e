//! Engine configuration.

use std::time::Duration;

use crate::errors::ConfigError;
use crate::geometry::EdgeInsets;

/// Default idle time before the reuse pool bulk-evicts its views.
pub const DEFAULT_REUSE_TTL: Duration = Duration::from_secs(5);

/// What happens to a view when it enters the reuse pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RemovalPolicy {
    /// Detach the view from its container
    #[default]
    Remove,
    /// Keep it attached but hidden
    Hide,
}

/// Options recognized by the render engine.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Idle time before pooled views are evicted
    #[cfg_attr(feature = "serde", serde(with = "ttl_seconds"))]
    pub reuse_ttl: Duration,
    /// Remove vs hide for enqueued views
    pub removal_policy: RemovalPolicy,
    /// Inset applied to the viewport before the visibility query.
    /// Negative values pre-render content outside the viewport.
    pub visible_frame_inset: EdgeInsets,
    /// Call the animator's shift hook when the content offset moves mid-pass
    pub animate_size_changes: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reuse_ttl: DEFAULT_REUSE_TTL,
            removal_policy: RemovalPolicy::default(),
            visible_frame_inset: EdgeInsets::ZERO,
            animate_size_changes: true,
        }
    }
}

impl EngineConfig {
    pub fn with_reuse_ttl(mut self, ttl: Duration) -> Self {
        self.reuse_ttl = ttl;
        self
    }

    pub fn with_removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.removal_policy = policy;
        self
    }

    pub fn with_visible_frame_inset(mut self, inset: EdgeInsets) -> Self {
        self.visible_frame_inset = inset;
        self
    }

    pub fn with_animate_size_changes(mut self, animate: bool) -> Self {
        self.animate_size_changes = animate;
        self
    }

    /// Check the configuration for values the engine cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reuse_ttl.is_zero() {
            return Err(ConfigError::NonPositiveTtl { ttl: self.reuse_ttl });
        }
        if !self.visible_frame_inset.is_finite() {
            return Err(ConfigError::InvalidInset);
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    #[cfg(feature = "serde")]
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(feature = "serde")]
mod ttl_seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ttl: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(ttl.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let seconds = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(seconds).map_err(serde::de::Error::custom)
    }
}

use serde::{Deserialize, Serialize};

/// Engine settings supplied at construction.
///
/// Every field has a default, so configuration files may set any subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ceiling for talent points. Defaults to unlimited.
    pub points_cap: u32,

    /// Ceiling for seals. Defaults to unlimited.
    pub seal_cap: u32,

    /// Number of unlocked base-tier nodes that completes the base tier and
    /// opens the specializations. `None` means the whole base tier.
    pub base_completion_threshold: Option<u32>,
}

impl EngineConfig {
    /// Unlimited budget, whole-base completion.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_caps(mut self, points_cap: u32, seal_cap: u32) -> Self {
        self.points_cap = points_cap;
        self.seal_cap = seal_cap;
        self
    }

    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.base_completion_threshold = Some(threshold);
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            points_cap: u32::MAX,
            seal_cap: u32::MAX,
            base_completion_threshold: None,
        }
    }
}

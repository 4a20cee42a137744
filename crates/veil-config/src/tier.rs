//! Merge tiers
//!
//! ```text
//! effective = page OR navigation OR item OR default
//! ```

use serde::{Deserialize, Serialize};

use crate::protection::ProtectionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigTier {
    /// Shipped baseline
    Default,
    /// Settings attached to the displayed content item
    Item,
    /// Settings attached to the current route
    Navigation,
    /// Settings of the hosting page, highest priority
    Page,
}

impl ConfigTier {
    /// Whether overrides for this tier are keyed by a scope
    pub fn is_scoped(&self) -> bool {
        matches!(self, ConfigTier::Item | ConfigTier::Navigation | ConfigTier::Page)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigTier::Default => "default",
            ConfigTier::Item => "item",
            ConfigTier::Navigation => "navigation",
            ConfigTier::Page => "page",
        }
    }
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ConfigTier {
    type Err = crate::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(ConfigTier::Default),
            "item" => Ok(ConfigTier::Item),
            "navigation" | "nav" => Ok(ConfigTier::Navigation),
            "page" => Ok(ConfigTier::Page),
            _ => Err(crate::ConfigError::UnknownTier(s.to_string())),
        }
    }
}

/// Merge all tiers into the effective configuration.
///
/// Total and pure: every field of the result is the OR of that field
/// across the four inputs, so a lower tier can never downgrade a
/// protection enabled higher up (and vice versa).
pub fn merge(
    base: &ProtectionConfig,
    nav: &ProtectionConfig,
    page: &ProtectionConfig,
    item: &ProtectionConfig,
) -> ProtectionConfig {
    base.union(item).union(nav).union(page)
}

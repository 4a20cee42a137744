//! Veil Protection Configuration
//!
//! A flat record of boolean protections, merged from four tiers:
//! - Default: shipped baseline
//! - Item: per displayed content item
//! - Navigation: per route
//! - Page: the hosting page
//!
//! Merge is a per-field OR. Once any tier enables a protection no other
//! tier can turn it off.

mod error;
mod protection;
mod provider;
mod tier;

pub use error::ConfigError;
pub use protection::{ProtectionConfig, ProtectionFlag};
pub use provider::{Selection, SettingsProvider, TierOverride};
pub use tier::{merge, ConfigTier};

pub type Result<T> = std::result::Result<T, ConfigError>;

//! Settings provider
//!
//! Persists tier overrides, tracks which item and route are on screen,
//! and republishes the merged configuration whenever it changes.
//! Subscribers always receive a whole record, never a partial update.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use url::Url;

use veil_storage::Database;

use crate::error::ConfigError;
use crate::protection::ProtectionConfig;
use crate::tier::{merge, ConfigTier};
use crate::Result;

const DEFAULTS_KEY: &str = "protection_defaults";
const PAGE_SCOPE: &str = "page";

/// A stored override for one tier scope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierOverride {
    pub tier: ConfigTier,
    pub scope: String,
    pub config: ProtectionConfig,
    pub updated_at: DateTime<Utc>,
}

/// What the viewer is currently showing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub item_id: Option<String>,
    /// Normalized route path, e.g. `/dashboard/files`
    pub route: String,
}

struct ProviderState {
    defaults: ProtectionConfig,
    selection: Selection,
    overrides: HashMap<(ConfigTier, String), TierOverride>,
}

impl ProviderState {
    fn lookup(&self, tier: ConfigTier, scope: Option<&str>) -> ProtectionConfig {
        scope
            .and_then(|scope| self.overrides.get(&(tier, scope.to_string())))
            .map(|o| o.config)
            .unwrap_or_default()
    }

    fn effective(&self) -> ProtectionConfig {
        merge(
            &self.defaults,
            &self.lookup(ConfigTier::Navigation, Some(&self.selection.route)),
            &self.lookup(ConfigTier::Page, Some(PAGE_SCOPE)),
            &self.lookup(ConfigTier::Item, self.selection.item_id.as_deref()),
        )
    }
}

pub struct SettingsProvider {
    db: Database,
    state: Arc<RwLock<ProviderState>>,
    publisher: Arc<watch::Sender<ProtectionConfig>>,
}

impl SettingsProvider {
    /// Load persisted tiers. `fallback_defaults` is used until a default
    /// tier has been stored.
    pub fn new(db: Database, fallback_defaults: ProtectionConfig) -> Result<Self> {
        let defaults = match db.get_json::<ProtectionConfig>(DEFAULTS_KEY) {
            Ok(Some(stored)) => stored,
            Ok(None) => fallback_defaults,
            Err(e) => {
                tracing::warn!("Ignoring unreadable protection defaults: {}", e);
                fallback_defaults
            }
        };

        let overrides = Self::load_overrides(&db)?;

        let state = ProviderState {
            defaults,
            selection: Selection {
                item_id: None,
                route: "/".to_string(),
            },
            overrides,
        };
        let (publisher, _) = watch::channel(state.effective());

        tracing::info!(
            overrides = state.overrides.len(),
            "Loaded protection settings"
        );

        Ok(Self {
            db,
            state: Arc::new(RwLock::new(state)),
            publisher: Arc::new(publisher),
        })
    }

    fn load_overrides(db: &Database) -> Result<HashMap<(ConfigTier, String), TierOverride>> {
        let rows: Vec<(String, String, String, String)> = db.with_connection(|conn| {
            let mut stmt =
                conn.prepare("SELECT tier, scope, config, updated_at FROM protection_overrides")?;

            let rows = stmt
                .query_map([], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
                })?
                .filter_map(|r| match r {
                    Ok(row) => Some(row),
                    Err(e) => {
                        tracing::warn!("Skipping unreadable override row: {}", e);
                        None
                    }
                })
                .collect();

            Ok(rows)
        })?;

        let mut overrides = HashMap::new();
        for (tier, scope, config, updated) in rows {
            let (tier, config) = match (
                tier.parse::<ConfigTier>(),
                serde_json::from_str::<ProtectionConfig>(&config),
            ) {
                (Ok(tier), Ok(config)) => (tier, config),
                _ => {
                    tracing::warn!(tier = %tier, scope = %scope, "Skipping malformed override row");
                    continue;
                }
            };

            let updated_at = DateTime::parse_from_rfc3339(&updated)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now());

            overrides.insert(
                (tier, scope.clone()),
                TierOverride {
                    tier,
                    scope,
                    config,
                    updated_at,
                },
            );
        }

        Ok(overrides)
    }

    /// Current merged configuration
    pub fn effective(&self) -> ProtectionConfig {
        *self.publisher.borrow()
    }

    /// Receive every republished configuration
    pub fn subscribe(&self) -> watch::Receiver<ProtectionConfig> {
        self.publisher.subscribe()
    }

    pub fn selection(&self) -> Selection {
        self.state.read().selection.clone()
    }

    pub fn defaults(&self) -> ProtectionConfig {
        self.state.read().defaults
    }

    /// Replace the default tier and persist it
    pub fn set_defaults(&self, defaults: ProtectionConfig) -> Result<ProtectionConfig> {
        self.db.set_json(DEFAULTS_KEY, &defaults)?;
        self.state.write().defaults = defaults;
        Ok(self.republish())
    }

    /// Point the provider at the item and location now on screen
    pub fn select(&self, item_id: Option<&str>, location: &str) -> Result<ProtectionConfig> {
        let route = route_for(location)?;
        let item_id = item_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        tracing::debug!(route = %route, item_id = ?item_id, "Protection selection changed");

        self.state.write().selection = Selection { item_id, route };
        Ok(self.republish())
    }

    /// Store an override for one tier scope. Navigation scopes accept
    /// either a route or a full location; the page tier has a single scope.
    pub fn set_override(
        &self,
        tier: ConfigTier,
        scope: &str,
        config: ProtectionConfig,
    ) -> Result<ProtectionConfig> {
        let scope = normalize_scope(tier, scope)?;
        let updated_at = Utc::now();
        let config_json = serde_json::to_string(&config)?;

        self.db.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO protection_overrides (tier, scope, config, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![tier.as_str(), scope, config_json, updated_at.to_rfc3339()],
            )?;
            Ok(())
        })?;

        self.state.write().overrides.insert(
            (tier, scope.clone()),
            TierOverride {
                tier,
                scope: scope.clone(),
                config,
                updated_at,
            },
        );

        tracing::info!(tier = %tier, scope = %scope, "Stored protection override");

        Ok(self.republish())
    }

    /// Remove an override. Returns whether one existed.
    pub fn clear_override(&self, tier: ConfigTier, scope: &str) -> Result<bool> {
        let scope = normalize_scope(tier, scope)?;

        self.db.with_connection(|conn| {
            conn.execute(
                "DELETE FROM protection_overrides WHERE tier = ?1 AND scope = ?2",
                rusqlite::params![tier.as_str(), scope],
            )?;
            Ok(())
        })?;

        let existed = self
            .state
            .write()
            .overrides
            .remove(&(tier, scope))
            .is_some();

        if existed {
            self.republish();
        }

        Ok(existed)
    }

    /// Drop every override and the stored default tier, falling back to
    /// `fallback_defaults`
    pub fn reset(&self, fallback_defaults: ProtectionConfig) -> Result<ProtectionConfig> {
        let removed = self.db.transaction(|conn| {
            let removed = conn.execute("DELETE FROM protection_overrides", [])?;
            conn.execute("DELETE FROM settings WHERE key = ?1", [DEFAULTS_KEY])?;
            Ok(removed)
        })?;

        {
            let mut state = self.state.write();
            state.overrides.clear();
            state.defaults = fallback_defaults;
        }

        tracing::info!(removed, "Reset protection settings");

        Ok(self.republish())
    }

    /// All stored overrides ordered by tier then scope
    pub fn overrides(&self) -> Vec<TierOverride> {
        let mut out: Vec<TierOverride> = self.state.read().overrides.values().cloned().collect();
        out.sort_by(|a, b| a.tier.cmp(&b.tier).then_with(|| a.scope.cmp(&b.scope)));
        out
    }

    fn republish(&self) -> ProtectionConfig {
        let next = self.state.read().effective();

        let changed = self.publisher.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });

        if changed {
            tracing::info!(
                enabled = ?next.enabled_flags(),
                "Republished protection config"
            );
        }

        next
    }
}

impl Clone for SettingsProvider {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            state: Arc::clone(&self.state),
            publisher: Arc::clone(&self.publisher),
        }
    }
}

fn normalize_scope(tier: ConfigTier, scope: &str) -> Result<String> {
    match tier {
        ConfigTier::Default => Err(ConfigError::NotOverridable(tier)),
        ConfigTier::Page => Ok(PAGE_SCOPE.to_string()),
        ConfigTier::Navigation => route_for(scope),
        ConfigTier::Item => {
            let scope = scope.trim();
            if scope.is_empty() {
                Err(ConfigError::EmptyScope)
            } else {
                Ok(scope.to_string())
            }
        }
    }
}

/// Reduce a location (absolute URL or bare path) to its route path
fn route_for(location: &str) -> Result<String> {
    let location = location.trim();
    if location.is_empty() {
        return Err(ConfigError::EmptyScope);
    }

    let parsed = match Url::parse(location) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse("http://localhost/")
            .and_then(|base| base.join(location))
            .map_err(|_| ConfigError::InvalidLocation(location.to_string()))?,
        Err(_) => return Err(ConfigError::InvalidLocation(location.to_string())),
    };

    let path = parsed.path().trim_end_matches('/');
    if path.is_empty() {
        Ok("/".to_string())
    } else {
        Ok(path.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protection::ProtectionFlag;

    fn only(flag: ProtectionFlag) -> ProtectionConfig {
        ProtectionConfig::default().with(flag)
    }

    fn provider() -> SettingsProvider {
        let db = Database::open_in_memory().unwrap();
        SettingsProvider::new(db, only(ProtectionFlag::VisualWatermark)).unwrap()
    }

    #[test]
    fn test_route_normalization() {
        assert_eq!(route_for("https://app.example.com/dashboard/").unwrap(), "/dashboard");
        assert_eq!(route_for("/dashboard/files?tab=2").unwrap(), "/dashboard/files");
        assert_eq!(route_for("https://app.example.com").unwrap(), "/");
        assert!(route_for("   ").is_err());
    }

    #[test]
    fn test_defaults_apply_without_overrides() {
        let provider = provider();
        assert_eq!(provider.effective(), only(ProtectionFlag::VisualWatermark));
    }

    #[test]
    fn test_tiers_follow_selection() {
        let provider = provider();
        provider
            .set_override(ConfigTier::Item, "file-1", only(ProtectionFlag::AntiScreenshot))
            .unwrap();
        provider
            .set_override(
                ConfigTier::Navigation,
                "https://app.example.com/dashboard/",
                only(ProtectionFlag::BlockShortcuts),
            )
            .unwrap();

        // Nothing selected yet: only the default tier
        assert!(!provider.effective().anti_screenshot);

        let effective = provider.select(Some("file-1"), "/dashboard").unwrap();
        assert!(effective.anti_screenshot);
        assert!(effective.block_shortcuts);
        assert!(effective.visual_watermark);

        let effective = provider.select(Some("file-2"), "/wallet").unwrap();
        assert!(!effective.anti_screenshot);
        assert!(!effective.block_shortcuts);
    }

    #[test]
    fn test_page_tier_cannot_be_downgraded() {
        let provider = provider();
        provider
            .set_override(ConfigTier::Page, "ignored", only(ProtectionFlag::TabFocusProtection))
            .unwrap();
        provider
            .set_override(ConfigTier::Item, "file-1", ProtectionConfig::default())
            .unwrap();

        let effective = provider.select(Some("file-1"), "/").unwrap();
        assert!(effective.tab_focus_protection);
    }

    #[test]
    fn test_default_tier_not_overridable() {
        let provider = provider();
        let result = provider.set_override(ConfigTier::Default, "x", ProtectionConfig::default());
        assert!(matches!(result, Err(ConfigError::NotOverridable(_))));
        assert!(matches!(
            provider.set_override(ConfigTier::Item, "  ", ProtectionConfig::default()),
            Err(ConfigError::EmptyScope)
        ));
    }

    #[test]
    fn test_subscribers_see_whole_records() {
        let provider = provider();
        let mut rx = provider.subscribe();
        assert!(!rx.has_changed().unwrap());

        provider
            .set_override(ConfigTier::Page, "page", ProtectionConfig::all_enabled())
            .unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), ProtectionConfig::all_enabled());

        // Same effective value: no notification
        provider
            .set_override(ConfigTier::Item, "file-9", only(ProtectionFlag::BlockPip))
            .unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_reset_clears_everything() {
        let db = Database::open_in_memory().unwrap();
        let provider = SettingsProvider::new(db.clone(), ProtectionConfig::default()).unwrap();
        provider
            .set_override(ConfigTier::Page, "page", only(ProtectionFlag::AntiScreenshot))
            .unwrap();
        provider.set_defaults(only(ProtectionFlag::BlockPip)).unwrap();

        let effective = provider
            .reset(only(ProtectionFlag::VisualWatermark))
            .unwrap();
        assert_eq!(effective, only(ProtectionFlag::VisualWatermark));
        assert!(provider.overrides().is_empty());

        let reloaded = SettingsProvider::new(db, ProtectionConfig::default()).unwrap();
        assert_eq!(reloaded.effective(), ProtectionConfig::default());
    }

    #[test]
    fn test_unreadable_rows_skipped_on_load() {
        let db = Database::open_in_memory().unwrap();
        {
            let provider = SettingsProvider::new(db.clone(), ProtectionConfig::default()).unwrap();
            provider
                .set_override(ConfigTier::Item, "file-1", only(ProtectionFlag::BlockPip))
                .unwrap();
        }

        // A blob in the config column cannot be read back as text
        db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO protection_overrides (tier, scope, config, updated_at)
                 SELECT tier, 'file-2', X'7B7D', updated_at FROM protection_overrides",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        let reloaded = SettingsProvider::new(db, ProtectionConfig::default()).unwrap();
        assert_eq!(reloaded.overrides().len(), 1);
        assert!(reloaded.select(Some("file-1"), "/").unwrap().block_pip);
        assert!(!reloaded.select(Some("file-2"), "/").unwrap().block_pip);
    }

    #[test]
    fn test_overrides_persist() {
        let db = Database::open_in_memory().unwrap();
        {
            let provider = SettingsProvider::new(db.clone(), ProtectionConfig::default()).unwrap();
            provider
                .set_override(ConfigTier::Item, "file-1", only(ProtectionFlag::BlockPrintScreen))
                .unwrap();
            provider
                .set_defaults(only(ProtectionFlag::ForensicWatermark))
                .unwrap();
        }

        let reloaded = SettingsProvider::new(db, ProtectionConfig::default()).unwrap();
        assert_eq!(reloaded.defaults(), only(ProtectionFlag::ForensicWatermark));
        assert_eq!(reloaded.overrides().len(), 1);

        let effective = reloaded.select(Some("file-1"), "/").unwrap();
        assert!(effective.block_print_screen);

        assert!(reloaded.clear_override(ConfigTier::Item, "file-1").unwrap());
        assert!(!reloaded.clear_override(ConfigTier::Item, "file-1").unwrap());
        assert!(!reloaded.effective().block_print_screen);
    }
}

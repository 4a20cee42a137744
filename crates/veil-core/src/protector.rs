//! Protector container
//!
//! Owns the settings database and provider. Viewers are opened against
//! whatever the provider resolves for the selected item and location.

use std::sync::Arc;

use veil_config::SettingsProvider;
use veil_presentation::{Clock, SystemClock};
use veil_storage::Database;

use crate::config::Config;
use crate::environment::Environment;
use crate::viewer::ProtectedViewer;
use crate::Result;

pub struct Protector {
    config: Config,
    db: Database,
    settings: SettingsProvider,
    clock: Arc<dyn Clock>,
}

impl Protector {
    pub fn new(config: Config) -> Result<Self> {
        let db = Database::open(&config.database_path)?;
        Self::with_database(config, db)
    }

    /// Protector backed by a throwaway database
    pub fn in_memory(config: Config) -> Result<Self> {
        let db = Database::open_in_memory()?;
        Self::with_database(config, db)
    }

    fn with_database(config: Config, db: Database) -> Result<Self> {
        let settings = SettingsProvider::new(db.clone(), config.base_protection)?;

        tracing::info!(
            database = %config.database_path.display(),
            "Protector initialized"
        );

        Ok(Self {
            config,
            db,
            settings,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the time source handed to new viewers
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn settings(&self) -> &SettingsProvider {
        &self.settings
    }

    /// Select the item and location, then open a viewer on the merged config
    pub fn open_viewer<E: Environment>(
        &self,
        item_id: Option<&str>,
        location: &str,
        environment: E,
    ) -> Result<ProtectedViewer<E>> {
        let effective = self.settings.select(item_id, location)?;

        Ok(ProtectedViewer::new(
            environment,
            effective,
            self.config.timings,
            self.clock.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::RecordingEnvironment;
    use std::path::PathBuf;
    use std::time::Duration;
    use veil_config::{ConfigTier, ProtectionConfig, ProtectionFlag};
    use veil_presentation::{ManualClock, SurfaceState};
    use veil_signals::{KeyEvent, RawEvent};

    fn protector() -> (Arc<ManualClock>, Protector) {
        let clock = Arc::new(ManualClock::starting_now());
        let protector = Protector::in_memory(Config::new(PathBuf::from("/tmp/veil-test")))
            .unwrap()
            .with_clock(clock.clone());
        (clock, protector)
    }

    #[test]
    fn test_opens_database_in_missing_data_dir() {
        let data_dir = std::env::temp_dir()
            .join(format!("veil-{}", uuid::Uuid::new_v4()))
            .join("profile");

        let protector = Protector::new(Config::new(data_dir.clone())).unwrap();
        assert!(data_dir.join("veil.db").exists());

        drop(protector);
        let _ = std::fs::remove_dir_all(data_dir.parent().unwrap());
    }

    #[test]
    fn test_viewer_uses_merged_tiers() {
        let (_, protector) = protector();
        let settings = protector.settings();

        settings
            .set_override(
                ConfigTier::Item,
                "film-42",
                ProtectionConfig::default().with(ProtectionFlag::BlockPrintScreen),
            )
            .unwrap();
        settings
            .set_override(
                ConfigTier::Navigation,
                "/library",
                ProtectionConfig::default().with(ProtectionFlag::TabFocusProtection),
            )
            .unwrap();

        let viewer = protector
            .open_viewer(
                Some("film-42"),
                "https://app.example.com/library/",
                RecordingEnvironment::new(),
            )
            .unwrap();

        let config = viewer.config();
        assert!(config.block_print_screen);
        assert!(config.tab_focus_protection);
        assert!(config.visual_watermark);
        assert!(!config.anti_screenshot);
        assert!(viewer.snapshot().watermarks.visual);
    }

    #[test]
    fn test_viewer_runs_on_injected_clock() {
        let (clock, protector) = protector();
        protector
            .settings()
            .set_override(
                ConfigTier::Page,
                "page",
                ProtectionConfig::default().with(ProtectionFlag::AntiScreenshot),
            )
            .unwrap();

        let mut viewer = protector
            .open_viewer(None, "/", RecordingEnvironment::new())
            .unwrap();
        viewer
            .handle_event(&RawEvent::KeyDown(KeyEvent::new("PrintScreen")))
            .unwrap();
        assert_eq!(viewer.surface_state(), SurfaceState::PenaltyLocked);

        clock.advance(Duration::from_millis(3000));
        viewer.advance().unwrap();
        assert_eq!(viewer.surface_state(), SurfaceState::Visible);
    }
}

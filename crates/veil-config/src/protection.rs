//! Protection flag record
//!
//! Field names serialize in camelCase so records written by the web
//! dashboard load unchanged. Every field defaults to `false`, so a
//! partial record always deserializes to a fully populated one.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProtectionConfig {
    pub block_right_click: bool,
    pub block_print_screen: bool,
    pub block_keyboard: bool,
    pub block_shortcuts: bool,
    pub anti_screenshot: bool,
    pub tab_focus_protection: bool,
    pub block_media_recorder: bool,
    #[serde(rename = "blockPiP")]
    pub block_pip: bool,
    pub forensic_watermark: bool,
    pub visual_watermark: bool,
    pub watermark_overlay: bool,
    pub geo_restriction: bool,
    pub expire_after_view: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtectionFlag {
    BlockRightClick,
    BlockPrintScreen,
    BlockKeyboard,
    BlockShortcuts,
    AntiScreenshot,
    TabFocusProtection,
    BlockMediaRecorder,
    BlockPip,
    ForensicWatermark,
    VisualWatermark,
    WatermarkOverlay,
    GeoRestriction,
    ExpireAfterView,
}

impl ProtectionFlag {
    pub const ALL: [ProtectionFlag; 13] = [
        ProtectionFlag::BlockRightClick,
        ProtectionFlag::BlockPrintScreen,
        ProtectionFlag::BlockKeyboard,
        ProtectionFlag::BlockShortcuts,
        ProtectionFlag::AntiScreenshot,
        ProtectionFlag::TabFocusProtection,
        ProtectionFlag::BlockMediaRecorder,
        ProtectionFlag::BlockPip,
        ProtectionFlag::ForensicWatermark,
        ProtectionFlag::VisualWatermark,
        ProtectionFlag::WatermarkOverlay,
        ProtectionFlag::GeoRestriction,
        ProtectionFlag::ExpireAfterView,
    ];

    /// Key used by the dashboard settings records
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtectionFlag::BlockRightClick => "blockRightClick",
            ProtectionFlag::BlockPrintScreen => "blockPrintScreen",
            ProtectionFlag::BlockKeyboard => "blockKeyboard",
            ProtectionFlag::BlockShortcuts => "blockShortcuts",
            ProtectionFlag::AntiScreenshot => "antiScreenshot",
            ProtectionFlag::TabFocusProtection => "tabFocusProtection",
            ProtectionFlag::BlockMediaRecorder => "blockMediaRecorder",
            ProtectionFlag::BlockPip => "blockPiP",
            ProtectionFlag::ForensicWatermark => "forensicWatermark",
            ProtectionFlag::VisualWatermark => "visualWatermark",
            ProtectionFlag::WatermarkOverlay => "watermarkOverlay",
            ProtectionFlag::GeoRestriction => "geoRestriction",
            ProtectionFlag::ExpireAfterView => "expireAfterView",
        }
    }
}

impl std::fmt::Display for ProtectionFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProtectionFlag {
    type Err = crate::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProtectionFlag::ALL
            .into_iter()
            .find(|flag| flag.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| crate::ConfigError::UnknownFlag(s.to_string()))
    }
}

impl ProtectionConfig {
    /// Record with every protection enabled
    pub fn all_enabled() -> Self {
        ProtectionFlag::ALL
            .into_iter()
            .fold(Self::default(), |config, flag| config.with(flag))
    }

    pub fn get(&self, flag: ProtectionFlag) -> bool {
        match flag {
            ProtectionFlag::BlockRightClick => self.block_right_click,
            ProtectionFlag::BlockPrintScreen => self.block_print_screen,
            ProtectionFlag::BlockKeyboard => self.block_keyboard,
            ProtectionFlag::BlockShortcuts => self.block_shortcuts,
            ProtectionFlag::AntiScreenshot => self.anti_screenshot,
            ProtectionFlag::TabFocusProtection => self.tab_focus_protection,
            ProtectionFlag::BlockMediaRecorder => self.block_media_recorder,
            ProtectionFlag::BlockPip => self.block_pip,
            ProtectionFlag::ForensicWatermark => self.forensic_watermark,
            ProtectionFlag::VisualWatermark => self.visual_watermark,
            ProtectionFlag::WatermarkOverlay => self.watermark_overlay,
            ProtectionFlag::GeoRestriction => self.geo_restriction,
            ProtectionFlag::ExpireAfterView => self.expire_after_view,
        }
    }

    pub fn set(&mut self, flag: ProtectionFlag, enabled: bool) {
        let field = match flag {
            ProtectionFlag::BlockRightClick => &mut self.block_right_click,
            ProtectionFlag::BlockPrintScreen => &mut self.block_print_screen,
            ProtectionFlag::BlockKeyboard => &mut self.block_keyboard,
            ProtectionFlag::BlockShortcuts => &mut self.block_shortcuts,
            ProtectionFlag::AntiScreenshot => &mut self.anti_screenshot,
            ProtectionFlag::TabFocusProtection => &mut self.tab_focus_protection,
            ProtectionFlag::BlockMediaRecorder => &mut self.block_media_recorder,
            ProtectionFlag::BlockPip => &mut self.block_pip,
            ProtectionFlag::ForensicWatermark => &mut self.forensic_watermark,
            ProtectionFlag::VisualWatermark => &mut self.visual_watermark,
            ProtectionFlag::WatermarkOverlay => &mut self.watermark_overlay,
            ProtectionFlag::GeoRestriction => &mut self.geo_restriction,
            ProtectionFlag::ExpireAfterView => &mut self.expire_after_view,
        };
        *field = enabled;
    }

    /// Builder-style enable
    pub fn with(mut self, flag: ProtectionFlag) -> Self {
        self.set(flag, true);
        self
    }

    /// Per-field OR of two records
    pub fn union(&self, other: &ProtectionConfig) -> ProtectionConfig {
        let mut out = *self;
        for flag in ProtectionFlag::ALL {
            if other.get(flag) {
                out.set(flag, true);
            }
        }
        out
    }

    pub fn enabled_flags(&self) -> Vec<ProtectionFlag> {
        ProtectionFlag::ALL
            .into_iter()
            .filter(|flag| self.get(*flag))
            .collect()
    }

    /// Screenshot chords and window blur are guarded by either flag
    pub fn guards_screenshots(&self) -> bool {
        self.anti_screenshot || self.block_print_screen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_record_fills_defaults() {
        let config: ProtectionConfig =
            serde_json::from_str(r#"{"antiScreenshot": true, "blockPiP": true}"#).unwrap();

        assert!(config.anti_screenshot);
        assert!(config.block_pip);
        assert_eq!(config.enabled_flags().len(), 2);
    }

    #[test]
    fn test_serializes_dashboard_keys() {
        let json = serde_json::to_value(ProtectionConfig::default().with(ProtectionFlag::BlockPip))
            .unwrap();
        assert_eq!(json["blockPiP"], true);
        assert_eq!(json["tabFocusProtection"], false);
        assert_eq!(json.as_object().unwrap().len(), ProtectionFlag::ALL.len());
    }

    #[test]
    fn test_flag_get_set() {
        let mut config = ProtectionConfig::default();
        for flag in ProtectionFlag::ALL {
            assert!(!config.get(flag));
            config.set(flag, true);
            assert!(config.get(flag));
        }
        assert_eq!(config, ProtectionConfig::all_enabled());
    }

    #[test]
    fn test_flag_parse() {
        assert_eq!(
            "blockMediaRecorder".parse::<ProtectionFlag>().unwrap(),
            ProtectionFlag::BlockMediaRecorder
        );
        assert_eq!(
            "BLOCKPIP".parse::<ProtectionFlag>().unwrap(),
            ProtectionFlag::BlockPip
        );
        assert!("blockEverything".parse::<ProtectionFlag>().is_err());
    }

    #[test]
    fn test_union_is_or() {
        let a = ProtectionConfig::default().with(ProtectionFlag::AntiScreenshot);
        let b = ProtectionConfig::default().with(ProtectionFlag::BlockShortcuts);
        let merged = a.union(&b);

        assert!(merged.anti_screenshot);
        assert!(merged.block_shortcuts);
        assert!(merged.guards_screenshots());
        assert_eq!(a.union(&ProtectionConfig::default()), a);
    }
}

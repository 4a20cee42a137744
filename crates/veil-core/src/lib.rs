//! Veil Core
//!
//! Wires the detector, policy and presentation layers into protected
//! viewer sessions, and owns the settings that configure them.

mod config;
mod environment;
mod error;
mod protector;
mod viewer;

pub use config::Config;
pub use environment::{EnvCall, Environment, RecordingEnvironment};
pub use error::{CaptureApiError, ClipboardError, CoreError};
pub use protector::Protector;
pub use viewer::{ProtectedViewer, ViewerSnapshot, WatermarkLayers};

// Re-export the layers a host needs
pub use veil_config::{ConfigTier, ProtectionConfig, ProtectionFlag, SettingsProvider};
pub use veil_policy::{Decision, PolicyTimings};
pub use veil_presentation::{
    Clock, ContentStyle, ManualClock, Overlay, OverlaySeverity, ProtectionState, Surface,
    SurfaceError, SurfaceState, SystemClock, TimerPurpose,
};
pub use veil_signals::{KeyEvent, RawEvent, Signal};
pub use veil_storage::{Database, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging. Output goes to stderr so tools can print JSON on stdout.
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

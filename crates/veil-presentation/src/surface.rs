//! Output port towards the page
//!
//! The controller never renders markup. It tells the host how the
//! content container should look and whether an overlay or a warning
//! banner should be on screen.

use serde::{Deserialize, Serialize};

use crate::error::SurfaceError;

/// Observable style of the protected content container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentStyle {
    /// `visibility`/`opacity` at rest when true, suppressed when false
    pub visible: bool,
    /// Blur filter applied on top
    pub blurred: bool,
}

impl ContentStyle {
    pub const VISIBLE: ContentStyle = ContentStyle {
        visible: true,
        blurred: false,
    };

    pub const HIDDEN: ContentStyle = ContentStyle {
        visible: false,
        blurred: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlaySeverity {
    Warning,
    PenaltyBlock,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overlay {
    pub message: String,
    pub severity: OverlaySeverity,
}

impl Overlay {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: OverlaySeverity::Warning,
        }
    }

    pub fn penalty(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: OverlaySeverity::PenaltyBlock,
        }
    }
}

pub trait Surface {
    /// Apply the content style. The container may not be mounted yet.
    fn set_content_style(&mut self, style: ContentStyle) -> Result<(), SurfaceError>;

    /// Mount (`Some`) or unmount (`None`) the full-screen block
    fn set_overlay(&mut self, overlay: Option<&Overlay>);

    /// Show (`Some`) or hide (`None`) the transient warning banner
    fn set_warning(&mut self, warning: Option<&Overlay>);
}

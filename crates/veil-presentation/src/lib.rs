//! Veil Presentation Controller
//!
//! Owns the protected surface of one viewer session:
//! ```text
//! Visible
//!   ↓ blur / tab hidden          ↓ screenshot chord
//! SuppressedTransient  ──────→  PenaltyLocked
//!   ↓ focus / tab visible         ↓ penalty timer
//! Visible  ←──────────────────────┘
//! ```
//! A recording-block flash overlays the surface independently.
//! All timers live in one registry so teardown cancels everything.

mod clock;
mod controller;
mod error;
mod state;
mod surface;
mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{PresentationController, SuppressMode};
pub use error::SurfaceError;
pub use state::{ProtectionState, SurfaceState};
pub use surface::{ContentStyle, Overlay, OverlaySeverity, Surface};
pub use timer::{ScheduledTimer, TimerPurpose, TimerRegistry};

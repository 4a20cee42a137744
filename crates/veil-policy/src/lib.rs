//! Veil Protection Policy
//!
//! Decides what a signal means under the active configuration. The
//! evaluator never touches presentation state; it returns decisions and
//! the viewer hands them to the presentation controller.

mod decision;
mod evaluator;
pub mod messages;
mod timings;

pub use decision::Decision;
pub use evaluator::PolicyEvaluator;
pub use timings::PolicyTimings;

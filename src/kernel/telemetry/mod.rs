//! Resolution telemetry.
//!
//! # SAFETY INVARIANT
//! Telemetry is a write-only side layer. Nothing in the resolution
//! pipeline reads it back to make a decision.
//!
//! # PRIVACY INVARIANT
//! Events never carry user content (utterance text, commands, facts).
//! Only enums, counts and durations are allowed.

pub mod event;
pub mod metrics;
pub mod recorder;

pub use event::{DropReason, ResolutionPath, TelemetryEvent};
pub use recorder::TelemetryRecorder;

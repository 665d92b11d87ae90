//! Patter is an embeddable "is typing…" indicator engine for chat interfaces.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the indicator state machine, its runtime state, the
//!   pacing loops (sound cues, simulated pauses, idle timeouts), and the
//!   settings record.
//! - [`ui`] renders indicator markup: text templates, group rosters, and the
//!   class list the host applies to the indicator node.
//! - [`host`] defines the seams to the embedding application: the display
//!   surface, avatar resolution, and the event pump that feeds the engine.
//! - [`audio`] defines the pluggable cue player and volume jitter helpers.
//!
//! The host owns the transcript, the display surface, and the event bus; it
//! forwards lifecycle events ([`core::events::HostEvent`]) into an
//! [`IndicatorEngine`] and pumps the engine's tick channel back into it.
//! Everything the engine does to the outside world goes through the
//! [`host::HostSurface`] and [`audio::CuePlayer`] traits, so the whole state
//! machine is testable without a real UI or audio device.

pub mod audio;
pub mod core;
pub mod host;
pub mod ui;
pub mod utils;

pub use crate::core::engine::IndicatorEngine;
pub use crate::core::events::HostEvent;
pub use crate::core::settings::IndicatorSettings;

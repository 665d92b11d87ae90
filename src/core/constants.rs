//! Shared timing and layout constants used across the indicator engine.

use std::ops::Range;
use std::time::Duration;

/// How long the hiding transition runs before the indicator node is removed.
pub const FADE_OUT: Duration = Duration::from_millis(250);

/// Inter-cue delay for the sound-pacing loop, standard rhythm.
pub const SOUND_DELAY_STANDARD_MS: Range<u64> = 300..500;

/// Inter-cue delay for the sound-pacing loop when dynamic rhythm is on.
pub const SOUND_DELAY_DYNAMIC_MS: Range<u64> = 150..600;

/// Volume jitter applied to every cue after the first, as a fraction of the
/// configured volume.
pub const CUE_VOLUME_JITTER: Range<f32> = 0.6..1.0;

/// Volume jitter for the user-side keystroke cue.
pub const USER_CUE_VOLUME_JITTER: Range<f32> = 0.7..1.0;

/// How long a simulated pause holds the paused visual state.
pub const PAUSE_HOLD_MS: Range<u64> = 300..900;

/// Interval between pause-simulation decision ticks.
pub const PAUSE_TICK_MS: Range<u64> = 800..2300;

/// Idle timeout for the user-side indicator when the host does not configure
/// one.
pub const DEFAULT_USER_IDLE_TIMEOUT_MS: u64 = 600;

/// Display-column budget for the group-chat name roster before it is
/// truncated to "A, B, +N more".
pub const ROSTER_MAX_WIDTH: usize = 48;

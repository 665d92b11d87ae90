//! The cue player seam. The engine treats cue synthesis as an opaque side
//! effect: it picks a volume and a theme, and whatever the host plugged in
//! does the rest. Playback failure is a warning, never an error the caller
//! sees — the visual indicator must not care whether audio works.

use std::ops::Range;

use crate::core::settings::SoundTheme;
use crate::utils::rng::RandomSource;

pub type CueError = Box<dyn std::error::Error + Send + Sync>;

/// Plays one short synthesized cue at the given volume.
pub trait CuePlayer: Send {
    fn play(&mut self, volume: f32, theme: SoundTheme) -> Result<(), CueError>;
}

/// Player for hosts without an audio subsystem. Every cue is a successful
/// no-op.
#[derive(Debug, Default)]
pub struct NullCues;

impl CuePlayer for NullCues {
    fn play(&mut self, _volume: f32, _theme: SoundTheme) -> Result<(), CueError> {
        Ok(())
    }
}

/// The user-side keystroke cue always uses the same theme, regardless of the
/// configured character-side theme.
pub const USER_SOUND_THEME: SoundTheme = SoundTheme::Soft;

/// Scale `base` by a fresh draw from `jitter`, clamped to the playable
/// range.
pub fn jittered_volume(rng: &mut dyn RandomSource, base: f32, jitter: Range<f32>) -> f32 {
    let factor = jitter.start + rng.next_unit() as f32 * (jitter.end - jitter.start);
    (base * factor).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::{CUE_VOLUME_JITTER, USER_CUE_VOLUME_JITTER};
    use crate::utils::rng::OsRandom;

    #[test]
    fn jittered_volume_stays_within_the_jitter_band() {
        let mut rng = OsRandom::new();
        for _ in 0..1000 {
            let volume = jittered_volume(&mut rng, 1.0, CUE_VOLUME_JITTER);
            assert!((0.6..=1.0).contains(&volume), "volume {volume} out of band");

            let user = jittered_volume(&mut rng, 1.0, USER_CUE_VOLUME_JITTER);
            assert!((0.7..=1.0).contains(&user), "volume {user} out of band");
        }
    }

    #[test]
    fn jittered_volume_never_exceeds_unity() {
        let mut rng = OsRandom::new();
        for _ in 0..100 {
            assert!(jittered_volume(&mut rng, 1.8, CUE_VOLUME_JITTER) <= 1.0);
        }
    }
}

//! Cancelable self-rescheduling timers. Each loop runs as a spawned task
//! that owns a [`CancellationToken`] and reports firings to the engine as
//! [`EngineTick`] messages over an unbounded channel. The tasks never touch
//! engine state; every tick is stamped with the lifecycle epoch it was
//! spawned under so the engine can drop ticks from a torn-down cycle.

use std::ops::Range;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::constants::{
    PAUSE_HOLD_MS, PAUSE_TICK_MS, SOUND_DELAY_DYNAMIC_MS, SOUND_DELAY_STANDARD_MS,
};
use crate::utils::rng::RandomSource;

/// Timer firings delivered back to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineTick {
    /// The sound-pacing loop wants the next cue played.
    SoundCue { epoch: u64 },
    /// The pause-simulation loop wants a pause/no-pause decision.
    PauseTick { epoch: u64 },
    /// A held pause expired.
    PauseOver { epoch: u64 },
    /// The hide fade-out finished; remove the indicator node.
    Unmount { epoch: u64 },
    /// The user-side idle timeout expired.
    UserIdle { epoch: u64 },
}

fn sample_ms(rng: &mut dyn RandomSource, range: Range<u64>) -> Duration {
    let span = (range.end - range.start) as f64;
    Duration::from_millis(range.start + (rng.next_unit() * span) as u64)
}

/// Fresh inter-cue delay for the sound-pacing loop.
pub fn sound_delay(rng: &mut dyn RandomSource, dynamic_rhythm: bool) -> Duration {
    let range = if dynamic_rhythm {
        SOUND_DELAY_DYNAMIC_MS
    } else {
        SOUND_DELAY_STANDARD_MS
    };
    sample_ms(rng, range)
}

/// Fresh interval until the next pause-simulation decision.
pub fn pause_tick_delay(rng: &mut dyn RandomSource) -> Duration {
    sample_ms(rng, PAUSE_TICK_MS)
}

/// Fresh duration for holding the paused visual state.
pub fn pause_hold_delay(rng: &mut dyn RandomSource) -> Duration {
    sample_ms(rng, PAUSE_HOLD_MS)
}

/// Start the sound-pacing loop. The first cue is played by the caller; this
/// schedules every subsequent cue after a delay sampled fresh each cycle.
pub(crate) fn spawn_sound_loop(
    tx: mpsc::UnboundedSender<EngineTick>,
    epoch: u64,
    mut rng: Box<dyn RandomSource>,
    dynamic_rhythm: bool,
) -> CancellationToken {
    let token = CancellationToken::new();
    let loop_token = token.clone();
    tokio::spawn(async move {
        loop {
            let delay = sound_delay(rng.as_mut(), dynamic_rhythm);
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    if tx.send(EngineTick::SoundCue { epoch }).is_err() {
                        break;
                    }
                }
                _ = loop_token.cancelled() => break,
            }
        }
    });
    token
}

/// Start the pause-simulation loop. The pause/no-pause roll happens in the
/// engine when each tick is handled; this only paces the decisions.
pub(crate) fn spawn_pause_loop(
    tx: mpsc::UnboundedSender<EngineTick>,
    epoch: u64,
    mut rng: Box<dyn RandomSource>,
) -> CancellationToken {
    let token = CancellationToken::new();
    let loop_token = token.clone();
    tokio::spawn(async move {
        loop {
            let delay = pause_tick_delay(rng.as_mut());
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    if tx.send(EngineTick::PauseTick { epoch }).is_err() {
                        break;
                    }
                }
                _ = loop_token.cancelled() => break,
            }
        }
    });
    token
}

/// Fire a single tick after `delay` unless cancelled first.
pub(crate) fn spawn_once(
    tx: mpsc::UnboundedSender<EngineTick>,
    tick: EngineTick,
    delay: Duration,
) -> CancellationToken {
    let token = CancellationToken::new();
    let task_token = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                let _ = tx.send(tick);
            }
            _ = task_token.cancelled() => {}
        }
    });
    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::rng::OsRandom;

    #[test]
    fn standard_sound_delays_stay_in_range() {
        let mut rng = OsRandom::new();
        for _ in 0..1000 {
            let delay = sound_delay(&mut rng, false).as_millis() as u64;
            assert!((300..=500).contains(&delay), "delay {delay}ms out of range");
        }
    }

    #[test]
    fn dynamic_sound_delays_stay_in_range() {
        let mut rng = OsRandom::new();
        for _ in 0..1000 {
            let delay = sound_delay(&mut rng, true).as_millis() as u64;
            assert!((150..=600).contains(&delay), "delay {delay}ms out of range");
        }
    }

    #[test]
    fn pause_delays_stay_in_range() {
        let mut rng = OsRandom::new();
        for _ in 0..1000 {
            let tick = pause_tick_delay(&mut rng).as_millis() as u64;
            let hold = pause_hold_delay(&mut rng).as_millis() as u64;
            assert!((800..=2300).contains(&tick));
            assert!((300..=900).contains(&hold));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn sound_loop_stops_scheduling_once_cancelled() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let token = spawn_sound_loop(tx, 1, Box::new(OsRandom::new()), false);

        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(500)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_ok(), "expected at least one firing");

        token.cancel();
        tokio::task::yield_now().await;
        while rx.try_recv().is_ok() {}

        tokio::time::advance(Duration::from_secs(10)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err(), "loop fired after cancellation");
    }

    #[tokio::test(start_paused = true)]
    async fn one_shot_fires_once_and_respects_cancellation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _fired = spawn_once(
            tx.clone(),
            EngineTick::Unmount { epoch: 3 },
            Duration::from_millis(250),
        );
        let cancelled = spawn_once(
            tx,
            EngineTick::Unmount { epoch: 4 },
            Duration::from_millis(250),
        );
        cancelled.cancel();

        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(250)).await;
        tokio::task::yield_now().await;

        assert!(matches!(
            rx.try_recv(),
            Ok(EngineTick::Unmount { epoch: 3 })
        ));
        assert!(rx.try_recv().is_err());
    }
}

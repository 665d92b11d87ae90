use std::collections::BTreeSet;

use tokio_util::sync::CancellationToken;

/// Cancel and drop whatever loop the slot holds. Safe on empty slots and on
/// already-cancelled tokens.
pub(crate) fn cancel_slot(slot: &mut Option<CancellationToken>) {
    if let Some(token) = slot.take() {
        token.cancel();
    }
}

/// Runtime state of the character-side indicator. One instance per engine,
/// reset on every show and every hide.
#[derive(Debug, Default)]
pub struct RuntimeState {
    /// Whether the character indicator is currently mounted.
    pub visible: bool,
    /// Thinking sub-state; meaningful only while `visible`.
    pub thinking: bool,
    /// Names of characters currently generating (group mode only).
    pub typing_characters: BTreeSet<String>,
    /// A cue was deferred until the first stream token.
    pub pending_sound_on_stream: bool,
    /// Lifecycle epoch. Bumped on every show and hide; ticks stamped with an
    /// older epoch are dropped, so a late callback can never mutate state
    /// after teardown.
    pub epoch: u64,
    /// Reasoning-watch subscription is live.
    pub watching: bool,
    pub sound_loop: Option<CancellationToken>,
    pub pause_loop: Option<CancellationToken>,
    pub pause_hold: Option<CancellationToken>,
    pub pending_unmount: Option<CancellationToken>,
}

impl RuntimeState {
    /// Cancel every pacing loop. Idempotent; never-started loops are a
    /// no-op.
    pub fn cancel_loops(&mut self) {
        cancel_slot(&mut self.sound_loop);
        cancel_slot(&mut self.pause_loop);
        cancel_slot(&mut self.pause_hold);
    }

    pub fn next_epoch(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }
}

/// State of the user-side indicator: a single idle-timeout handle plus its
/// own staleness epoch.
#[derive(Debug, Default)]
pub struct UserIndicatorState {
    pub epoch: u64,
    pub idle: Option<CancellationToken>,
}

impl UserIndicatorState {
    pub fn next_epoch(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }
}

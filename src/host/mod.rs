//! Seams to the embedding application: the display surface the engine
//! mutates, avatar resolution, and the event pump that drives the engine
//! from the host's bus.

use tokio::sync::mpsc;

use crate::core::engine::IndicatorEngine;
use crate::core::events::{HostEvent, MessageId};
use crate::core::pacing::EngineTick;
use crate::core::settings::GlowStyle;
use crate::ui::markup::IndicatorMarkup;

/// The two singleton indicator nodes. The engine addresses nodes only
/// through this identity and re-queries existence before every mount, so a
/// host that re-renders its chat out from under us just loses the indicator
/// until the next show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorNode {
    Character,
    User,
}

/// Display capabilities the engine needs from the host. Implementations
/// should treat a missing anchor (chat container gone, send form gone) as a
/// silent no-op; the engine never learns about it beyond `exists` returning
/// false.
pub trait HostSurface: Send {
    fn exists(&self, node: IndicatorNode) -> bool;

    /// Insert a fresh indicator node. Called only after `exists` returned
    /// false.
    fn mount(&mut self, node: IndicatorNode, markup: &IndicatorMarkup);

    /// Replace the content and class list of an existing node in place,
    /// without restarting its entry animation.
    fn update(&mut self, node: IndicatorNode, markup: &IndicatorMarkup);

    /// Replace only the inner text, leaving wrapper classes untouched. Used
    /// for thinking-state re-renders.
    fn replace_text(&mut self, node: IndicatorNode, text: &str);

    fn add_class(&mut self, node: IndicatorNode, class: &str);

    fn remove_class(&mut self, node: IndicatorNode, class: &str);

    fn remove(&mut self, node: IndicatorNode);

    /// Commit the mount and apply [`crate::ui::markup::CLASS_VISIBLE`]. The
    /// host must force a synchronous layout read in between, or the entry
    /// transition will not animate.
    fn reveal(&mut self, node: IndicatorNode);

    fn set_glow(&mut self, node: IndicatorNode, glow: Option<&GlowStyle>);

    /// Whether the chat viewport was scrolled to within the host's
    /// near-bottom threshold. Sampled before the indicator is inserted.
    fn near_bottom(&self) -> bool;

    /// Scroll to the new bottom on the host's next frame, never
    /// synchronously.
    fn scroll_to_bottom(&mut self);

    /// Identity of the transcript's current last message. Recomputed on
    /// every call; the engine relies on this being fresh per mutation batch.
    fn last_message(&self) -> Option<MessageId>;

    /// The engine began caring about reasoning-block mutations; the host
    /// should start delivering [`HostEvent::ReasoningMutations`] batches.
    fn begin_reasoning_watch(&mut self) {}

    /// The engine stopped caring; the host may disconnect its observer.
    fn end_reasoning_watch(&mut self) {}
}

/// Best-effort avatar lookup against host structure.
pub trait AvatarResolver: Send {
    fn resolve(&self, is_user: bool) -> Option<String>;
}

/// Resolver for hosts without avatars.
#[derive(Debug, Default)]
pub struct NoAvatars;

impl AvatarResolver for NoAvatars {
    fn resolve(&self, _is_user: bool) -> Option<String> {
        None
    }
}

/// Pump host events and engine ticks into the engine until the host closes
/// its event channel. Ticks and events are interleaved in arrival order on
/// one task, which is what makes the engine safe to run lock-free.
pub async fn drive(
    engine: &mut IndicatorEngine,
    events: &mut mpsc::UnboundedReceiver<HostEvent>,
    ticks: &mut mpsc::UnboundedReceiver<EngineTick>,
) {
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => engine.handle_event(event),
                None => break,
            },
            tick = ticks.recv() => match tick {
                Some(tick) => engine.handle_tick(tick),
                None => break,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::core::settings::IndicatorSettings;
    use crate::utils::test_utils::create_test_engine;

    #[tokio::test(start_paused = true)]
    async fn drive_pumps_events_and_ticks_through_one_task() {
        let mut t = create_test_engine(IndicatorSettings {
            user_indicator: true,
            ..IndicatorSettings::default()
        });
        let (events_tx, mut events) = mpsc::unbounded_channel();
        events_tx.send(HostEvent::ComposerKeystroke).unwrap();

        let driver = drive(&mut t.engine, &mut events, &mut t.ticks);
        tokio::pin!(driver);
        // Paused time fast-forwards through the idle timeout while the pump
        // waits; the deadline only bounds the test.
        tokio::select! {
            _ = &mut driver => {}
            _ = tokio::time::sleep(Duration::from_millis(1_000)) => {}
        }

        {
            // The keystroke mounted the user indicator; the idle one-shot,
            // routed back through the tick channel, removed it again.
            let log = t.surface.lock().unwrap();
            assert_eq!(log.user.mounts, 1);
            assert_eq!(log.user.removals, 1);
            assert!(!log.user.exists);
        }

        // Closing the host's event channel ends the pump.
        drop(events_tx);
        driver.await;
    }
}

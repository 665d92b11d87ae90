//! The indicator state machine. One engine instance lives for the host
//! session; every generation turn moves it `Hidden` → `Visible/Typing`
//! (⇄ `Visible/Thinking`) → `Hidden`.
//!
//! The engine is driven entirely from the host's event pump: host events
//! arrive through [`IndicatorEngine::handle_event`], and the pacing loops it
//! spawns report back through the tick channel into
//! [`IndicatorEngine::handle_tick`]. Loops never touch state directly, and
//! every tick carries the lifecycle epoch it was spawned under, so teardown
//! plus the epoch check make late callbacks harmless by construction.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::audio::{jittered_volume, CuePlayer, USER_SOUND_THEME};
use crate::core::constants::{CUE_VOLUME_JITTER, FADE_OUT, USER_CUE_VOLUME_JITTER};
use crate::core::events::{
    GenerationKind, HostEvent, ReasoningMutation, REASONING_STATE_DONE, REASONING_STATE_THINKING,
};
use crate::core::pacing::{self, EngineTick};
use crate::core::settings::{IndicatorSettings, SoundTheme};
use crate::core::state::{cancel_slot, RuntimeState, UserIndicatorState};
use crate::host::{AvatarResolver, HostSurface, IndicatorNode};
use crate::ui::markup::{IndicatorMarkup, CLASS_HIDING, CLASS_PAUSED};
use crate::ui::renderer::{render, RenderRequest};
use crate::utils::rng::RandomSource;

pub struct IndicatorEngine {
    settings: IndicatorSettings,
    state: RuntimeState,
    user: UserIndicatorState,
    surface: Box<dyn HostSurface>,
    cues: Box<dyn CuePlayer>,
    avatars: Box<dyn AvatarResolver>,
    rng: Box<dyn RandomSource>,
    /// Identity of the character currently (or most recently) generating.
    character: Option<String>,
    user_name: String,
    tx: mpsc::UnboundedSender<EngineTick>,
}

impl IndicatorEngine {
    /// Build an engine and the tick channel the host must pump back into
    /// [`Self::handle_tick`].
    pub fn new(
        settings: IndicatorSettings,
        surface: Box<dyn HostSurface>,
        cues: Box<dyn CuePlayer>,
        avatars: Box<dyn AvatarResolver>,
        rng: Box<dyn RandomSource>,
        user_name: impl Into<String>,
    ) -> (Self, mpsc::UnboundedReceiver<EngineTick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                settings,
                state: RuntimeState::default(),
                user: UserIndicatorState::default(),
                surface,
                cues,
                avatars,
                rng,
                character: None,
                user_name: user_name.into(),
                tx,
            },
            rx,
        )
    }

    pub fn set_character(&mut self, name: Option<String>) {
        self.character = name;
    }

    pub fn character(&self) -> Option<&str> {
        self.character.as_deref()
    }

    pub fn settings(&self) -> &IndicatorSettings {
        &self.settings
    }

    /// Swap in fresh settings between rendering passes (the settings UI
    /// lives in the host).
    pub fn set_settings(&mut self, settings: IndicatorSettings) {
        self.settings = settings;
    }

    pub fn runtime(&self) -> &RuntimeState {
        &self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state.visible
    }

    pub fn is_thinking(&self) -> bool {
        self.state.thinking
    }

    pub fn handle_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::GenerationStarted {
                kind,
                character,
                dry_run,
            } => self.on_generation_start(kind, character, dry_run),
            HostEvent::StreamToken => self.on_stream_token(),
            HostEvent::GenerationStopped | HostEvent::GenerationEnded | HostEvent::ChatChanged => {
                self.hide()
            }
            HostEvent::CharacterMessageRendered { character } => {
                self.on_character_message_rendered(character)
            }
            HostEvent::MessageSent => self.on_message_sent(),
            HostEvent::ComposerKeystroke => self.on_keystroke(),
            HostEvent::ReasoningMutations(batch) => self.on_reasoning_mutations(&batch),
        }
    }

    pub fn handle_tick(&mut self, tick: EngineTick) {
        match tick {
            EngineTick::SoundCue { epoch } => {
                if epoch != self.state.epoch {
                    return;
                }
                if !self.state.visible || !self.settings.sound_enabled {
                    // Sound was switched off mid-turn; stop the loop instead
                    // of letting it fire into a wall of dropped ticks.
                    cancel_slot(&mut self.state.sound_loop);
                    return;
                }
                let volume = jittered_volume(
                    self.rng.as_mut(),
                    self.settings.cue_volume(),
                    CUE_VOLUME_JITTER,
                );
                self.play_cue(volume, self.settings.sound_theme);
            }
            EngineTick::PauseTick { epoch } => self.on_pause_tick(epoch),
            EngineTick::PauseOver { epoch } => {
                if epoch != self.state.epoch {
                    return;
                }
                self.state.pause_hold = None;
                self.surface
                    .remove_class(IndicatorNode::Character, CLASS_PAUSED);
            }
            EngineTick::Unmount { epoch } => {
                if epoch != self.state.epoch {
                    return;
                }
                self.state.pending_unmount = None;
                if self.surface.exists(IndicatorNode::Character) {
                    self.surface.remove(IndicatorNode::Character);
                }
            }
            EngineTick::UserIdle { epoch } => {
                if epoch != self.user.epoch {
                    return;
                }
                self.user.idle = None;
                if self.surface.exists(IndicatorNode::User) {
                    self.surface.remove(IndicatorNode::User);
                }
            }
        }
    }

    fn on_generation_start(
        &mut self,
        kind: GenerationKind,
        character: Option<String>,
        dry_run: bool,
    ) {
        if !self.settings.enabled {
            return;
        }
        if dry_run || kind.suppresses_indicator() {
            debug!(?kind, dry_run, "generation start suppressed");
            return;
        }
        let Some(name) = character.or_else(|| self.character.clone()) else {
            debug!("generation started without a character identity");
            return;
        };
        self.character = Some(name.clone());

        // A new start implicitly cancels whatever the previous lifecycle
        // left behind, including a fade-out still in flight.
        self.teardown();
        cancel_slot(&mut self.state.pending_unmount);
        let epoch = self.state.next_epoch();

        if self.settings.group_mode {
            self.state.typing_characters.insert(name.clone());
        }

        let markup = self.render_markup(false);
        if self.surface.exists(IndicatorNode::Character) {
            // No duplicate node, no entry-animation restart.
            self.surface.update(IndicatorNode::Character, &markup);
        } else {
            // Sample scroll position before insertion changes the layout.
            let was_at_bottom = self.surface.near_bottom();
            self.surface.mount(IndicatorNode::Character, &markup);
            let glow = self.settings.glow_style();
            self.surface.set_glow(IndicatorNode::Character, glow.as_ref());
            self.surface.reveal(IndicatorNode::Character);
            if was_at_bottom {
                self.surface.scroll_to_bottom();
            }
        }
        self.state.visible = true;

        if self.settings.sound_enabled {
            if self.settings.sound_on_stream {
                self.state.pending_sound_on_stream = true;
            } else {
                self.start_sound_loop(epoch);
            }
        }
        if self.settings.detect_thinking {
            self.start_thinking_watch();
        }
        if self.settings.pause_enabled && !self.state.thinking {
            self.start_pause_loop(epoch);
        }
        debug!(epoch, character = %name, "indicator shown");
    }

    fn on_stream_token(&mut self) {
        if self.state.pending_sound_on_stream
            && self.state.visible
            && self.settings.sound_enabled
        {
            self.state.pending_sound_on_stream = false;
            self.start_sound_loop(self.state.epoch);
        }
    }

    fn on_character_message_rendered(&mut self, character: Option<String>) {
        if !self.state.visible {
            return;
        }
        if self.settings.group_mode {
            if let Some(name) = character {
                self.state.typing_characters.remove(&name);
            }
            if self.state.typing_characters.is_empty() {
                self.hide();
            } else {
                let markup = self.render_markup(false);
                self.surface
                    .replace_text(IndicatorNode::Character, &markup.text);
            }
        } else {
            self.hide();
        }
    }

    /// Tear down loops and sub-state, fade out, and remove the node once the
    /// fade finishes. Safe to call when already hidden.
    fn hide(&mut self) {
        let was_visible = self.state.visible;
        self.teardown();
        cancel_slot(&mut self.state.pending_unmount);
        self.state.typing_characters.clear();
        self.state.visible = false;
        let epoch = self.state.next_epoch();
        if self.surface.exists(IndicatorNode::Character) {
            self.surface
                .remove_class(IndicatorNode::Character, CLASS_PAUSED);
            self.surface
                .add_class(IndicatorNode::Character, CLASS_HIDING);
            self.state.pending_unmount = Some(pacing::spawn_once(
                self.tx.clone(),
                EngineTick::Unmount { epoch },
                FADE_OUT,
            ));
        }
        if was_visible {
            debug!(epoch, "indicator hidden");
        }
    }

    fn teardown(&mut self) {
        self.state.cancel_loops();
        if self.state.watching {
            self.state.watching = false;
            self.surface.end_reasoning_watch();
        }
        self.state.thinking = false;
        self.state.pending_sound_on_stream = false;
    }

    fn start_sound_loop(&mut self, epoch: u64) {
        if self.state.sound_loop.is_some() {
            return;
        }
        // First cue fires at the configured volume; jitter applies from the
        // second cue on.
        self.play_cue(self.settings.cue_volume(), self.settings.sound_theme);
        self.state.sound_loop = Some(pacing::spawn_sound_loop(
            self.tx.clone(),
            epoch,
            self.rng.fork(),
            self.settings.dynamic_rhythm,
        ));
    }

    fn start_pause_loop(&mut self, epoch: u64) {
        if self.state.pause_loop.is_some() {
            return;
        }
        self.state.pause_loop = Some(pacing::spawn_pause_loop(
            self.tx.clone(),
            epoch,
            self.rng.fork(),
        ));
    }

    fn start_thinking_watch(&mut self) {
        if self.state.watching {
            return;
        }
        self.state.watching = true;
        self.surface.begin_reasoning_watch();
    }

    fn on_pause_tick(&mut self, epoch: u64) {
        if epoch != self.state.epoch {
            return;
        }
        // The host may have re-rendered the chat out from under us, or the
        // pause option flipped mid-turn. Either way the loop is done.
        if !self.state.visible
            || !self.settings.pause_enabled
            || !self.surface.exists(IndicatorNode::Character)
        {
            cancel_slot(&mut self.state.pause_loop);
            return;
        }
        if self.rng.next_unit() < self.settings.pause_chance() {
            self.surface.add_class(IndicatorNode::Character, CLASS_PAUSED);
            cancel_slot(&mut self.state.pause_hold);
            let hold = pacing::pause_hold_delay(self.rng.as_mut());
            self.state.pause_hold = Some(pacing::spawn_once(
                self.tx.clone(),
                EngineTick::PauseOver { epoch },
                hold,
            ));
        }
    }

    fn on_reasoning_mutations(&mut self, batch: &[ReasoningMutation]) {
        if !self.state.watching || !self.state.visible || !self.settings.detect_thinking {
            return;
        }
        // One fresh lookup per batch; a cached message here is how stale
        // turns leak into the live indicator.
        let Some(last) = self.surface.last_message() else {
            return;
        };
        for mutation in batch {
            if mutation.owner() != last {
                continue;
            }
            match mutation {
                ReasoningMutation::BlockInserted { state, .. } => {
                    if state == REASONING_STATE_THINKING && !self.state.thinking {
                        self.set_thinking(true);
                    }
                }
                ReasoningMutation::StateChanged { state, .. } => {
                    if state == REASONING_STATE_THINKING && !self.state.thinking {
                        self.set_thinking(true);
                    } else if state == REASONING_STATE_DONE && self.state.thinking {
                        self.set_thinking(false);
                    }
                }
            }
        }
    }

    fn set_thinking(&mut self, thinking: bool) {
        self.state.thinking = thinking;
        let markup = self.render_markup(false);
        self.surface
            .replace_text(IndicatorNode::Character, &markup.text);
        debug!(thinking, "thinking sub-state changed");
    }

    fn on_keystroke(&mut self) {
        if !self.settings.enabled || !self.settings.user_indicator {
            return;
        }
        if self.settings.sound_enabled {
            let volume = jittered_volume(
                self.rng.as_mut(),
                self.settings.cue_volume(),
                USER_CUE_VOLUME_JITTER,
            );
            self.play_cue(volume, USER_SOUND_THEME);
        }
        if !self.surface.exists(IndicatorNode::User) {
            let markup = self.render_markup(true);
            self.surface.mount(IndicatorNode::User, &markup);
        }
        // Every keystroke restarts the idle clock.
        cancel_slot(&mut self.user.idle);
        let epoch = self.user.next_epoch();
        self.user.idle = Some(pacing::spawn_once(
            self.tx.clone(),
            EngineTick::UserIdle { epoch },
            std::time::Duration::from_millis(self.settings.user_idle_timeout_ms),
        ));
    }

    fn on_message_sent(&mut self) {
        cancel_slot(&mut self.user.idle);
        self.user.next_epoch();
        if self.surface.exists(IndicatorNode::User) {
            self.surface.remove(IndicatorNode::User);
        }
    }

    fn render_markup(&self, is_user: bool) -> IndicatorMarkup {
        let group = (self.settings.group_mode && !is_user)
            .then_some(&self.state.typing_characters);
        let request = RenderRequest {
            is_user,
            thinking: self.state.thinking,
            character: self.character.as_deref().unwrap_or_default(),
            user_name: &self.user_name,
            group,
            avatar: self.avatars.resolve(is_user),
        };
        render(&self.settings, &request)
    }

    fn play_cue(&mut self, volume: f32, theme: SoundTheme) {
        if let Err(err) = self.cues.play(volume, theme) {
            warn!(error = %err, "cue playback failed; continuing without sound");
        }
    }
}

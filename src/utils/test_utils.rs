#[cfg(test)]
use std::collections::VecDeque;
#[cfg(test)]
use std::sync::{Arc, Mutex};

#[cfg(test)]
use crate::audio::{CueError, CuePlayer};
#[cfg(test)]
use crate::core::engine::IndicatorEngine;
#[cfg(test)]
use crate::core::events::MessageId;
#[cfg(test)]
use crate::core::pacing::EngineTick;
#[cfg(test)]
use crate::core::settings::{GlowStyle, IndicatorSettings, SoundTheme};
#[cfg(test)]
use crate::host::{AvatarResolver, HostSurface, IndicatorNode};
#[cfg(test)]
use crate::ui::markup::IndicatorMarkup;
#[cfg(test)]
use crate::utils::rng::{OsRandom, RandomSource};

#[cfg(test)]
#[derive(Debug, Default)]
pub struct NodeLog {
    pub exists: bool,
    pub text: String,
    pub classes: Vec<String>,
    pub glow: Option<GlowStyle>,
    pub mounts: usize,
    pub updates: usize,
    pub text_replacements: usize,
    pub removals: usize,
}

#[cfg(test)]
impl NodeLog {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct SurfaceLog {
    pub character: NodeLog,
    pub user: NodeLog,
    pub near_bottom: bool,
    pub scrolls: usize,
    pub reveals: usize,
    pub last_message: Option<MessageId>,
    pub watch_begun: usize,
    pub watch_ended: usize,
}

#[cfg(test)]
impl SurfaceLog {
    fn node_mut(&mut self, node: IndicatorNode) -> &mut NodeLog {
        match node {
            IndicatorNode::Character => &mut self.character,
            IndicatorNode::User => &mut self.user,
        }
    }
}

/// Recording surface backed by shared state the test can inspect after the
/// engine takes ownership.
#[cfg(test)]
#[derive(Clone)]
pub struct TestSurface {
    pub log: Arc<Mutex<SurfaceLog>>,
}

#[cfg(test)]
impl TestSurface {
    pub fn new() -> (Self, Arc<Mutex<SurfaceLog>>) {
        let log = Arc::new(Mutex::new(SurfaceLog::default()));
        (Self { log: log.clone() }, log)
    }
}

#[cfg(test)]
impl HostSurface for TestSurface {
    fn exists(&self, node: IndicatorNode) -> bool {
        let log = self.log.lock().unwrap();
        match node {
            IndicatorNode::Character => log.character.exists,
            IndicatorNode::User => log.user.exists,
        }
    }

    fn mount(&mut self, node: IndicatorNode, markup: &IndicatorMarkup) {
        let mut log = self.log.lock().unwrap();
        let entry = log.node_mut(node);
        entry.exists = true;
        entry.text = markup.text.clone();
        entry.classes = markup.classes.clone();
        entry.mounts += 1;
    }

    fn update(&mut self, node: IndicatorNode, markup: &IndicatorMarkup) {
        let mut log = self.log.lock().unwrap();
        let entry = log.node_mut(node);
        entry.text = markup.text.clone();
        entry.classes = markup.classes.clone();
        entry.updates += 1;
    }

    fn replace_text(&mut self, node: IndicatorNode, text: &str) {
        let mut log = self.log.lock().unwrap();
        let entry = log.node_mut(node);
        entry.text = text.to_string();
        entry.text_replacements += 1;
    }

    fn add_class(&mut self, node: IndicatorNode, class: &str) {
        let mut log = self.log.lock().unwrap();
        let entry = log.node_mut(node);
        if !entry.has_class(class) {
            entry.classes.push(class.to_string());
        }
    }

    fn remove_class(&mut self, node: IndicatorNode, class: &str) {
        let mut log = self.log.lock().unwrap();
        log.node_mut(node).classes.retain(|c| c != class);
    }

    fn remove(&mut self, node: IndicatorNode) {
        let mut log = self.log.lock().unwrap();
        let entry = log.node_mut(node);
        entry.exists = false;
        entry.removals += 1;
    }

    fn reveal(&mut self, _node: IndicatorNode) {
        self.log.lock().unwrap().reveals += 1;
    }

    fn set_glow(&mut self, node: IndicatorNode, glow: Option<&GlowStyle>) {
        let mut log = self.log.lock().unwrap();
        log.node_mut(node).glow = glow.cloned();
    }

    fn near_bottom(&self) -> bool {
        self.log.lock().unwrap().near_bottom
    }

    fn scroll_to_bottom(&mut self) {
        self.log.lock().unwrap().scrolls += 1;
    }

    fn last_message(&self) -> Option<MessageId> {
        self.log.lock().unwrap().last_message
    }

    fn begin_reasoning_watch(&mut self) {
        self.log.lock().unwrap().watch_begun += 1;
    }

    fn end_reasoning_watch(&mut self) {
        self.log.lock().unwrap().watch_ended += 1;
    }
}

#[cfg(test)]
#[derive(Clone)]
pub struct RecordingCues {
    pub played: Arc<Mutex<Vec<(f32, SoundTheme)>>>,
    pub fail: bool,
}

#[cfg(test)]
impl RecordingCues {
    pub fn new() -> (Self, Arc<Mutex<Vec<(f32, SoundTheme)>>>) {
        let played = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                played: played.clone(),
                fail: false,
            },
            played,
        )
    }
}

#[cfg(test)]
impl CuePlayer for RecordingCues {
    fn play(&mut self, volume: f32, theme: SoundTheme) -> Result<(), CueError> {
        if self.fail {
            return Err("audio subsystem unavailable".into());
        }
        self.played.lock().unwrap().push((volume, theme));
        Ok(())
    }
}

#[cfg(test)]
pub struct NoTestAvatars;

#[cfg(test)]
impl AvatarResolver for NoTestAvatars {
    fn resolve(&self, _is_user: bool) -> Option<String> {
        None
    }
}

/// Scripted draw sequence; falls back to a constant once exhausted. Forked
/// sources (handed to pacing loops) use only the fallback.
#[cfg(test)]
pub struct ScriptedRandom {
    pub draws: VecDeque<f64>,
    pub fallback: f64,
}

#[cfg(test)]
impl ScriptedRandom {
    pub fn new(draws: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self {
            draws: draws.into_iter().collect(),
            fallback,
        }
    }
}

#[cfg(test)]
impl RandomSource for ScriptedRandom {
    fn next_unit(&mut self) -> f64 {
        self.draws.pop_front().unwrap_or(self.fallback)
    }

    fn fork(&mut self) -> Box<dyn RandomSource> {
        Box::new(ScriptedRandom::new([], self.fallback))
    }
}

#[cfg(test)]
pub struct TestEngine {
    pub engine: IndicatorEngine,
    pub ticks: tokio::sync::mpsc::UnboundedReceiver<EngineTick>,
    pub surface: Arc<Mutex<SurfaceLog>>,
    pub cues: Arc<Mutex<Vec<(f32, SoundTheme)>>>,
}

#[cfg(test)]
pub fn create_test_engine(settings: IndicatorSettings) -> TestEngine {
    create_test_engine_with_rng(settings, Box::new(OsRandom::seeded(7)))
}

#[cfg(test)]
pub fn create_test_engine_with_rng(
    settings: IndicatorSettings,
    rng: Box<dyn RandomSource>,
) -> TestEngine {
    let (surface, surface_log) = TestSurface::new();
    let (cue_player, cues) = RecordingCues::new();
    let (engine, ticks) = IndicatorEngine::new(
        settings,
        Box::new(surface),
        Box::new(cue_player),
        Box::new(NoTestAvatars),
        rng,
        "Sam",
    );
    let mut engine = engine;
    engine.set_character(Some("Alice".to_string()));
    TestEngine {
        engine,
        ticks,
        surface: surface_log,
        cues,
    }
}

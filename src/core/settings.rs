use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::constants::DEFAULT_USER_IDLE_TIMEOUT_MS;

/// Visual shell drawn around the indicator. Purely cosmetic; the engine only
/// forwards the derived class to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum IndicatorStyle {
    #[default]
    Bubble,
    Minimal,
    Console,
    Card,
    Banner,
    Pill,
    Ghost,
}

impl IndicatorStyle {
    pub fn class(self) -> &'static str {
        match self {
            IndicatorStyle::Bubble => "patter-style-bubble",
            IndicatorStyle::Minimal => "patter-style-minimal",
            IndicatorStyle::Console => "patter-style-console",
            IndicatorStyle::Card => "patter-style-card",
            IndicatorStyle::Banner => "patter-style-banner",
            IndicatorStyle::Pill => "patter-style-pill",
            IndicatorStyle::Ghost => "patter-style-ghost",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum IndicatorPosition {
    #[default]
    Bottom,
    Top,
    Inline,
}

impl IndicatorPosition {
    pub fn class(self) -> &'static str {
        match self {
            IndicatorPosition::Bottom => "patter-pos-bottom",
            IndicatorPosition::Top => "patter-pos-top",
            IndicatorPosition::Inline => "patter-pos-inline",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AnimationTheme {
    #[default]
    Dots,
    Pulse,
    Wave,
    Fade,
}

impl AnimationTheme {
    pub fn class(self) -> &'static str {
        match self {
            AnimationTheme::Dots => "patter-anim-dots",
            AnimationTheme::Pulse => "patter-anim-pulse",
            AnimationTheme::Wave => "patter-anim-wave",
            AnimationTheme::Fade => "patter-anim-fade",
        }
    }
}

/// Which synthesized cue family the player should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SoundTheme {
    #[default]
    Typewriter,
    Soft,
    Mechanical,
    OffBeat,
}

/// Glow styling forwarded to the host when the glow option is on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlowStyle {
    pub gradient: bool,
    pub colors: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_typing_text() -> String {
    "{{char}} is typing…".to_string()
}

fn default_thinking_text() -> String {
    "{{char}} is thinking…".to_string()
}

fn default_thinking_icon() -> String {
    "✦".to_string()
}

fn default_detect_thinking() -> bool {
    true
}

fn default_sound_volume() -> f32 {
    0.5
}

fn default_pause_chance() -> f64 {
    0.3
}

fn default_user_idle_timeout_ms() -> u64 {
    DEFAULT_USER_IDLE_TIMEOUT_MS
}

fn default_glow_colors() -> Vec<String> {
    vec!["#8be9fd".to_string()]
}

fn default_name_colors() -> Vec<String> {
    vec!["#ff79c6".to_string(), "#bd93f9".to_string()]
}

/// Flat record of every indicator option the host can persist. Missing
/// fields fall back to defaults during deserialization, so a host can store
/// any subset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSettings {
    /// Master switch for the whole subsystem.
    pub enabled: bool,
    pub style: IndicatorStyle,
    pub position: IndicatorPosition,
    pub animation: AnimationTheme,
    /// Template for the typing line. `{{char}}` and `{{user}}` expand to the
    /// character and user display names.
    pub typing_text: String,
    /// Template for the thinking line; same placeholders as `typing_text`.
    pub thinking_text: String,
    pub show_avatar: bool,
    pub show_user_avatar: bool,
    /// Watch the transcript for reasoning blocks and switch to the thinking
    /// sub-state while one is active.
    pub detect_thinking: bool,
    /// Prefixed to the thinking line when non-empty.
    pub thinking_icon: String,
    /// Aggregate the names of every currently-generating character instead
    /// of showing only the most recent one.
    pub group_mode: bool,
    pub sound_enabled: bool,
    pub sound_theme: SoundTheme,
    /// Base cue volume in 0.0–1.0. Out-of-range values are clamped at use.
    pub sound_volume: f32,
    /// Defer the first cue until the first stream token arrives.
    pub sound_on_stream: bool,
    /// Widen the inter-cue delay range for a less metronomic rhythm.
    pub dynamic_rhythm: bool,
    pub pause_enabled: bool,
    /// Probability in 0.0–1.0 that any given pause tick applies a pause.
    pub pause_chance: f64,
    pub user_indicator: bool,
    pub user_idle_timeout_ms: u64,
    pub user_right_align: bool,
    pub glow_enabled: bool,
    pub glow_gradient: bool,
    pub glow_colors: Vec<String>,
    pub name_gradient: bool,
    pub name_colors: Vec<String>,
    pub mobile: bool,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            style: IndicatorStyle::default(),
            position: IndicatorPosition::default(),
            animation: AnimationTheme::default(),
            typing_text: default_typing_text(),
            thinking_text: default_thinking_text(),
            show_avatar: true,
            show_user_avatar: false,
            detect_thinking: default_detect_thinking(),
            thinking_icon: default_thinking_icon(),
            group_mode: false,
            sound_enabled: false,
            sound_theme: SoundTheme::default(),
            sound_volume: default_sound_volume(),
            sound_on_stream: false,
            dynamic_rhythm: false,
            pause_enabled: false,
            pause_chance: default_pause_chance(),
            user_indicator: false,
            user_idle_timeout_ms: default_user_idle_timeout_ms(),
            user_right_align: false,
            glow_enabled: false,
            glow_gradient: false,
            glow_colors: default_glow_colors(),
            name_gradient: false,
            name_colors: default_name_colors(),
            mobile: false,
        }
    }
}

impl IndicatorSettings {
    /// Parse host-persisted TOML, merging missing fields with defaults.
    /// Malformed input degrades to the full default record; the indicator
    /// must never fail to come up over a bad settings file.
    pub fn from_toml_str(raw: &str) -> Self {
        match toml::from_str(raw) {
            Ok(settings) => settings,
            Err(err) => {
                warn!(error = %err, "indicator settings unreadable; using defaults");
                Self::default()
            }
        }
    }

    /// Configured cue volume, clamped into the playable range.
    pub fn cue_volume(&self) -> f32 {
        self.sound_volume.clamp(0.0, 1.0)
    }

    /// Configured pause probability, clamped into 0.0–1.0.
    pub fn pause_chance(&self) -> f64 {
        self.pause_chance.clamp(0.0, 1.0)
    }

    pub fn glow_style(&self) -> Option<GlowStyle> {
        self.glow_enabled.then(|| GlowStyle {
            gradient: self.glow_gradient,
            colors: self.glow_colors.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_fields() {
        let settings = IndicatorSettings::from_toml_str(
            r#"
            enabled = true
            sound_enabled = true
            sound_theme = "off-beat"
            style = "pill"
            "#,
        );
        assert!(settings.sound_enabled);
        assert_eq!(settings.sound_theme, SoundTheme::OffBeat);
        assert_eq!(settings.style, IndicatorStyle::Pill);
        assert_eq!(settings.typing_text, "{{char}} is typing…");
        assert_eq!(settings.user_idle_timeout_ms, 600);
    }

    #[test]
    fn malformed_settings_fall_back_to_defaults() {
        let settings = IndicatorSettings::from_toml_str("style = 17\nnot even toml [");
        assert!(settings.enabled);
        assert_eq!(settings.style, IndicatorStyle::Bubble);
    }

    #[test]
    fn volume_and_chance_are_clamped() {
        let settings = IndicatorSettings {
            sound_volume: 3.5,
            pause_chance: -0.2,
            ..IndicatorSettings::default()
        };
        assert_eq!(settings.cue_volume(), 1.0);
        assert_eq!(settings.pause_chance(), 0.0);
    }

    #[test]
    fn glow_style_only_present_when_enabled() {
        let mut settings = IndicatorSettings::default();
        assert!(settings.glow_style().is_none());
        settings.glow_enabled = true;
        let glow = settings.glow_style().expect("glow");
        assert_eq!(glow.colors, vec!["#8be9fd".to_string()]);
    }
}

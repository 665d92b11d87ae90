//! Pure markup construction: (settings, request) in, [`IndicatorMarkup`]
//! out. No state, no side effects, so every visual decision is directly
//! testable.

use std::collections::BTreeSet;

use unicode_width::UnicodeWidthStr;

use crate::core::constants::ROSTER_MAX_WIDTH;
use crate::core::settings::IndicatorSettings;
use crate::ui::markup::{
    IndicatorMarkup, CLASS_INDICATOR, CLASS_MOBILE, CLASS_NAME_GRADIENT, CLASS_RIGHT_ALIGN,
    CLASS_THINKING, CLASS_USER,
};

/// Everything the renderer needs to know about the current pass.
#[derive(Debug, Clone)]
pub struct RenderRequest<'a> {
    pub is_user: bool,
    pub thinking: bool,
    pub character: &'a str,
    pub user_name: &'a str,
    /// Currently-generating characters, when group mode is active.
    pub group: Option<&'a BTreeSet<String>>,
    pub avatar: Option<String>,
}

/// Expand `{{char}}` and `{{user}}` placeholders.
pub fn expand_placeholders(template: &str, character: &str, user: &str) -> String {
    template
        .replace("{{char}}", character)
        .replace("{{user}}", user)
}

/// Join group-chat names into a display roster, truncating to `max_width`
/// columns with a "+N more" tail. The first name is always kept.
pub fn group_roster(names: &BTreeSet<String>, max_width: usize) -> String {
    let mut roster = String::new();
    let mut shown = 0usize;
    for name in names {
        let candidate_width = roster.width() + name.width() + if shown > 0 { 2 } else { 0 };
        if shown > 0 && candidate_width > max_width {
            break;
        }
        if shown > 0 {
            roster.push_str(", ");
        }
        roster.push_str(name);
        shown += 1;
    }
    let hidden = names.len() - shown;
    if hidden > 0 {
        roster.push_str(&format!(", +{hidden} more"));
    }
    roster
}

pub fn render(settings: &IndicatorSettings, request: &RenderRequest<'_>) -> IndicatorMarkup {
    let display_name = if request.is_user {
        request.user_name.to_string()
    } else {
        match request.group {
            Some(names) if !names.is_empty() => group_roster(names, ROSTER_MAX_WIDTH),
            _ => request.character.to_string(),
        }
    };

    let thinking = request.thinking && !request.is_user;
    let template = if thinking {
        &settings.thinking_text
    } else {
        &settings.typing_text
    };
    let mut text = expand_placeholders(template, &display_name, request.user_name);
    if thinking && !settings.thinking_icon.is_empty() {
        text = format!("{} {}", settings.thinking_icon, text);
    }

    let mut classes = vec![
        CLASS_INDICATOR.to_string(),
        settings.style.class().to_string(),
        settings.position.class().to_string(),
        settings.animation.class().to_string(),
    ];
    if request.is_user {
        classes.push(CLASS_USER.to_string());
        if settings.user_right_align {
            classes.push(CLASS_RIGHT_ALIGN.to_string());
        }
    }
    if thinking {
        classes.push(CLASS_THINKING.to_string());
    }
    if settings.name_gradient {
        classes.push(CLASS_NAME_GRADIENT.to_string());
    }
    if settings.mobile {
        classes.push(CLASS_MOBILE.to_string());
    }

    let show_avatar = if request.is_user {
        settings.show_user_avatar
    } else {
        settings.show_avatar
    };

    IndicatorMarkup {
        text,
        classes,
        avatar: if show_avatar {
            request.avatar.clone()
        } else {
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::settings::{AnimationTheme, IndicatorStyle};

    fn request<'a>() -> RenderRequest<'a> {
        RenderRequest {
            is_user: false,
            thinking: false,
            character: "Alice",
            user_name: "Sam",
            group: None,
            avatar: None,
        }
    }

    #[test]
    fn typing_text_expands_placeholders() {
        let settings = IndicatorSettings {
            typing_text: "{{char}} is replying to {{user}}".to_string(),
            ..IndicatorSettings::default()
        };
        let markup = render(&settings, &request());
        assert_eq!(markup.text, "Alice is replying to Sam");
        assert!(markup.has_class(CLASS_INDICATOR));
        assert!(!markup.has_class(CLASS_THINKING));
    }

    #[test]
    fn thinking_uses_its_own_template_and_icon() {
        let settings = IndicatorSettings {
            thinking_text: "{{char}} is pondering".to_string(),
            thinking_icon: "✦".to_string(),
            ..IndicatorSettings::default()
        };
        let markup = render(
            &settings,
            &RenderRequest {
                thinking: true,
                ..request()
            },
        );
        assert_eq!(markup.text, "✦ Alice is pondering");
        assert!(markup.has_class(CLASS_THINKING));
    }

    #[test]
    fn user_side_never_renders_thinking() {
        let settings = IndicatorSettings::default();
        let markup = render(
            &settings,
            &RenderRequest {
                is_user: true,
                thinking: true,
                ..request()
            },
        );
        assert_eq!(markup.text, "Sam is typing…");
        assert!(markup.has_class(CLASS_USER));
        assert!(!markup.has_class(CLASS_THINKING));
    }

    #[test]
    fn group_roster_aggregates_names() {
        let settings = IndicatorSettings {
            group_mode: true,
            ..IndicatorSettings::default()
        };
        let names: BTreeSet<String> = ["Alice", "Bob"].iter().map(|s| s.to_string()).collect();
        let markup = render(
            &settings,
            &RenderRequest {
                group: Some(&names),
                ..request()
            },
        );
        assert_eq!(markup.text, "Alice, Bob is typing…");
    }

    #[test]
    fn group_roster_truncates_past_the_width_budget() {
        let names: BTreeSet<String> = (0..8).map(|i| format!("Character-{i:02}")).collect();
        let roster = group_roster(&names, 30);
        assert!(roster.starts_with("Character-00, Character-01"));
        assert!(roster.ends_with("+6 more"), "got {roster:?}");

        // A single over-budget name is still shown rather than dropped.
        let one: BTreeSet<String> = ["An-extremely-long-character-name".to_string()].into();
        assert_eq!(group_roster(&one, 5), "An-extremely-long-character-name");
    }

    #[test]
    fn style_position_and_animation_all_surface_as_classes() {
        let settings = IndicatorSettings {
            style: IndicatorStyle::Console,
            animation: AnimationTheme::Wave,
            mobile: true,
            ..IndicatorSettings::default()
        };
        let markup = render(&settings, &request());
        assert!(markup.has_class("patter-style-console"));
        assert!(markup.has_class("patter-pos-bottom"));
        assert!(markup.has_class("patter-anim-wave"));
        assert!(markup.has_class(CLASS_MOBILE));
    }

    #[test]
    fn avatar_respects_the_per_side_toggles() {
        let mut settings = IndicatorSettings::default();
        let with_avatar = RenderRequest {
            avatar: Some("https://host/avatars/alice.png".to_string()),
            ..request()
        };
        assert!(render(&settings, &with_avatar).avatar.is_some());

        settings.show_avatar = false;
        assert!(render(&settings, &with_avatar).avatar.is_none());
    }
}

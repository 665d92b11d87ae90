//! The markup handed to the host: one line of text plus the class list for
//! the indicator node. Class names are stable strings the host's stylesheet
//! keys on.

/// Base class carried by every indicator node.
pub const CLASS_INDICATOR: &str = "patter-indicator";
/// Marks the user-side indicator.
pub const CLASS_USER: &str = "patter-user";
/// Thinking sub-state variant.
pub const CLASS_THINKING: &str = "patter-thinking";
/// Applied by the host's `reveal` step to run the entry transition.
pub const CLASS_VISIBLE: &str = "patter-visible";
/// Applied while the hide fade-out runs.
pub const CLASS_HIDING: &str = "patter-hiding";
/// Applied for the duration of a simulated pause.
pub const CLASS_PAUSED: &str = "patter-paused";
/// Right-aligns the user-side indicator.
pub const CLASS_RIGHT_ALIGN: &str = "patter-right";
/// Compact layout for small screens.
pub const CLASS_MOBILE: &str = "patter-mobile";
/// Gradient name coloring.
pub const CLASS_NAME_GRADIENT: &str = "patter-name-gradient";

/// Render output for one indicator pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndicatorMarkup {
    /// The indicator line, templates already expanded.
    pub text: String,
    /// Full class list for the node wrapper.
    pub classes: Vec<String>,
    /// Avatar image URL, when avatars are enabled and resolvable.
    pub avatar: Option<String>,
}

impl IndicatorMarkup {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

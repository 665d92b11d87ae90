//! Inbound event vocabulary. The host's event bridge translates its own bus
//! into these and feeds them to the engine in arrival order.

/// What kind of generation the host just started. Only some kinds are
/// allowed to surface an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationKind {
    Normal,
    Continue,
    Regenerate,
    Swipe,
    /// Background/silent generation; never shows an indicator.
    Quiet,
    /// The host is generating text on the user's behalf.
    Impersonate,
}

impl GenerationKind {
    pub fn suppresses_indicator(self) -> bool {
        matches!(self, GenerationKind::Quiet | GenerationKind::Impersonate)
    }
}

/// Opaque identity of a transcript message, assigned by the host. Only
/// compared for equality, never dereferenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(pub u64);

/// Raw reasoning-block state attribute values the engine recognizes. Any
/// other value is ignored.
pub const REASONING_STATE_THINKING: &str = "thinking";
pub const REASONING_STATE_DONE: &str = "done";

/// One observed change to a reasoning block, tagged with the message that
/// owns the block so stale turns can be filtered out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReasoningMutation {
    /// A reasoning block appeared inside `owner` with the given state
    /// attribute.
    BlockInserted { owner: MessageId, state: String },
    /// The state attribute of an existing reasoning block changed.
    StateChanged { owner: MessageId, state: String },
}

impl ReasoningMutation {
    pub fn owner(&self) -> MessageId {
        match self {
            ReasoningMutation::BlockInserted { owner, .. }
            | ReasoningMutation::StateChanged { owner, .. } => *owner,
        }
    }
}

/// Lifecycle and input events delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    GenerationStarted {
        kind: GenerationKind,
        /// Character identity for this generation, when the host knows it.
        /// Falls back to the engine's configured character.
        character: Option<String>,
        /// Set for prompt-inspection passes that must have no visible effect.
        dry_run: bool,
    },
    GenerationStopped,
    GenerationEnded,
    ChatChanged,
    /// First and subsequent tokens of a streamed response.
    StreamToken,
    /// A character's finished message was rendered into the transcript.
    CharacterMessageRendered { character: Option<String> },
    /// The user submitted their message.
    MessageSent,
    /// A raw input event in the message-composition field.
    ComposerKeystroke,
    /// A batch of reasoning-block changes observed in the transcript.
    ReasoningMutations(Vec<ReasoningMutation>),
}

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// Who produced a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
    /// Only used for topic dividers.
    System,
}

/// Whether a turn is dialogue or a topic boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    #[default]
    Message,
    Divider,
}

/// Grammatical role of a sentence segment.
///
/// Closed set; the model is asked to tag each segment with one of the short
/// wire tags returned by [`GrammarRole::tag`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrammarRole {
    Subject,
    Predicate,
    Object,
    Attribute,
    Adverbial,
    Complement,
    Other,
}

impl GrammarRole {
    pub const ALL: [GrammarRole; 7] = [
        GrammarRole::Subject,
        GrammarRole::Predicate,
        GrammarRole::Object,
        GrammarRole::Attribute,
        GrammarRole::Adverbial,
        GrammarRole::Complement,
        GrammarRole::Other,
    ];

    /// Short tag used in the structured analysis response.
    pub fn tag(&self) -> &'static str {
        match self {
            GrammarRole::Subject => "sbj",
            GrammarRole::Predicate => "pred",
            GrammarRole::Object => "obj",
            GrammarRole::Attribute => "attr",
            GrammarRole::Adverbial => "adv",
            GrammarRole::Complement => "cmp",
            GrammarRole::Other => "oth",
        }
    }

    /// Parse a wire tag. Unknown tags return `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.tag() == tag)
    }
}

impl fmt::Display for GrammarRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GrammarRole::Subject => "subject",
            GrammarRole::Predicate => "predicate",
            GrammarRole::Object => "object",
            GrammarRole::Attribute => "attribute",
            GrammarRole::Adverbial => "adverbial",
            GrammarRole::Complement => "complement",
            GrammarRole::Other => "other",
        };
        f.write_str(name)
    }
}

/// Which side of an exchange is pending.
///
/// Anything other than `Idle` means an exchange is in flight and new
/// submissions must be rejected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingState {
    #[default]
    Idle,
    /// Waiting for the user's own message to appear (translation in progress).
    AwaitingUserEcho,
    /// Waiting for the assistant's reply.
    AwaitingAssistantReply,
}

impl LoadingState {
    pub fn is_busy(&self) -> bool {
        !matches!(self, LoadingState::Idle)
    }
}

impl fmt::Display for LoadingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadingState::Idle => write!(f, "Idle"),
            LoadingState::AwaitingUserEcho => write!(f, "AwaitingUserEcho"),
            LoadingState::AwaitingAssistantReply => write!(f, "AwaitingAssistantReply"),
        }
    }
}

// =============================================================================
// Newtype Wrappers
// =============================================================================

/// Unique identifier for a turn.
///
/// UUID v7, so ids sort in creation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TurnId(pub Uuid);

impl TurnId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unix timestamp in seconds since epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0, 0).unwrap_or_default()
    }
}

// =============================================================================
// Analysis
// =============================================================================

/// One grammatical segment of an analyzed sentence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// The source span covered by this segment.
    pub text: String,
    pub role: GrammarRole,
    /// Human-readable role label, e.g. "主语".
    pub label: String,
    pub part_of_speech: String,
    /// Translation of this segment alone.
    pub translation: String,
}

/// Structured grammatical breakdown of a sentence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    /// Translation of the whole sentence.
    pub translation: String,
    pub segments: Vec<Segment>,
}

impl Analysis {
    pub const UNAVAILABLE_TRANSLATION: &'static str = "Translation unavailable";

    /// Minimal but structurally valid analysis used when the model's structured
    /// response cannot be parsed: one `Other` segment spanning the whole input.
    pub fn degraded(text: &str) -> Self {
        Self {
            translation: Self::UNAVAILABLE_TRANSLATION.to_string(),
            segments: vec![Segment {
                text: text.to_string(),
                role: GrammarRole::Other,
                label: "Text".to_string(),
                part_of_speech: "Unknown".to_string(),
                translation: String::new(),
            }],
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.translation == Self::UNAVAILABLE_TRANSLATION
            && self.segments.len() == 1
            && self.segments[0].role == GrammarRole::Other
    }
}

// =============================================================================
// Turn
// =============================================================================

/// One entry of the conversation log: a dialogue message or a topic divider.
///
/// Everything except `analysis` is fixed at creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: TurnId,
    pub speaker: Speaker,
    pub kind: TurnKind,
    /// English rendering of the content. Empty for dividers.
    pub text: String,
    /// `None` until the background analysis resolves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Analysis>,
    pub created_at: Timestamp,
}

impl Turn {
    fn message(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            id: TurnId::new(),
            speaker,
            kind: TurnKind::Message,
            text: text.into(),
            analysis: None,
            created_at: Timestamp::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::message(Speaker::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::message(Speaker::Assistant, text)
    }

    pub fn divider() -> Self {
        Self {
            id: TurnId::new(),
            speaker: Speaker::System,
            kind: TurnKind::Divider,
            text: String::new(),
            analysis: None,
            created_at: Timestamp::now(),
        }
    }

    pub fn is_divider(&self) -> bool {
        self.kind == TurnKind::Divider
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }

    /// Wire role for OpenAI-compatible requests.
    pub fn to_api_role(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "assistant",
        }
    }

    pub fn is_user(self) -> bool {
        self == Role::User
    }

    pub fn is_model(self) -> bool {
        self == Role::Model
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Role::User),
            "model" => Ok(Role::Model),
            _ => Err(format!("invalid message role: {value}")),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

/// Tone presets for rendering a finished reply in the target language.
///
/// The set is closed: each variant carries its own request template, and the
/// per-message translation map is keyed by these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TranslationStyle {
    NewsSummary,
    WittyExpert,
    Formal,
    DetailedExplanation,
    FriendlyChat,
}

impl TranslationStyle {
    pub const ALL: [TranslationStyle; 5] = [
        TranslationStyle::NewsSummary,
        TranslationStyle::WittyExpert,
        TranslationStyle::Formal,
        TranslationStyle::DetailedExplanation,
        TranslationStyle::FriendlyChat,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TranslationStyle::NewsSummary => "news_summary",
            TranslationStyle::WittyExpert => "witty_expert",
            TranslationStyle::Formal => "formal",
            TranslationStyle::DetailedExplanation => "detailed_explanation",
            TranslationStyle::FriendlyChat => "friendly_chat",
        }
    }

    /// Human-readable label shown in the picker and translation headers.
    pub fn label(self) -> &'static str {
        match self {
            TranslationStyle::NewsSummary => "Fun News",
            TranslationStyle::WittyExpert => "Witty Expert",
            TranslationStyle::Formal => "Formal",
            TranslationStyle::DetailedExplanation => "Detailed Explanation",
            TranslationStyle::FriendlyChat => "Friendly Chat",
        }
    }

    /// Build the one-shot request prompt for this style.
    pub fn prompt(self, text: &str, target_language: &str) -> String {
        match self {
            TranslationStyle::NewsSummary => format!(
                "Translate the following text into {target_language}. The translation should \
                 be fun, funny, and easy to understand, as if explaining news to a friend. \
                 Keep the main points and substance of the original text. Text: \"{text}\""
            ),
            TranslationStyle::WittyExpert => format!(
                "Translate the following text into {target_language}. The translation should \
                 be smart, witty, and knowledgeable. Provide a complete and detailed \
                 translation, but add some appropriate humor or jokes to make it fun and \
                 engaging. Text: \"{text}\""
            ),
            TranslationStyle::Formal => format!(
                "Translate the following text into {target_language} using formal language. \
                 The tone should be professional and suitable for official communication. \
                 Text: \"{text}\""
            ),
            TranslationStyle::DetailedExplanation => format!(
                "Translate the following text into {target_language}. Provide a detailed \
                 translation, explaining any nuances, cultural context, or complex terms to \
                 ensure a deep understanding. The response should be comprehensive. \
                 Text: \"{text}\""
            ),
            TranslationStyle::FriendlyChat => format!(
                "Translate the following text into {target_language} in a casual, friendly, \
                 and conversational tone, as if you were talking to a close friend. Use \
                 informal language and slang where appropriate. Text: \"{text}\""
            ),
        }
    }
}

impl TryFrom<&str> for TranslationStyle {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "news_summary" => Ok(TranslationStyle::NewsSummary),
            "witty_expert" => Ok(TranslationStyle::WittyExpert),
            "formal" => Ok(TranslationStyle::Formal),
            "detailed_explanation" => Ok(TranslationStyle::DetailedExplanation),
            "friendly_chat" => Ok(TranslationStyle::FriendlyChat),
            _ => Err(format!("invalid translation style: {value}")),
        }
    }
}

impl TryFrom<String> for TranslationStyle {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<TranslationStyle> for String {
    fn from(value: TranslationStyle) -> Self {
        value.as_str().to_string()
    }
}

/// One entry of the message log.
///
/// `role` is fixed at creation. Model content grows by fragment appends while
/// its stream is open, then freezes. Translations are added per style and
/// never overwritten; at most one style is in flight per message at a time.
#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub translations: BTreeMap<TranslationStyle, String>,
    pub translating_style: Option<TranslationStyle>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            translations: BTreeMap::new(),
            translating_style: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self::new(Role::Model, content)
    }

    /// Empty model message that a reply stream appends into.
    pub fn model_placeholder() -> Self {
        Self::model(String::new())
    }

    pub fn is_user(&self) -> bool {
        self.role.is_user()
    }

    pub fn is_model(&self) -> bool {
        self.role.is_model()
    }

    pub fn translation(&self, style: TranslationStyle) -> Option<&str> {
        self.translations.get(&style).map(String::as_str)
    }

    pub fn has_translation(&self, style: TranslationStyle) -> bool {
        self.translations.contains_key(&style)
    }

    pub fn is_translating(&self) -> bool {
        self.translating_style.is_some()
    }
}

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CounselorError;

// =============================================================================
// Enums
// =============================================================================

/// Conversation language. Every message, classification and voice call is
/// tagged with one of these.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Hi];

    /// Short code used on the wire and in config files.
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
        }
    }

    /// BCP 47 locale tag handed to speech capture and synthesis.
    pub fn locale(&self) -> &'static str {
        match self {
            Language::En => "en-US",
            Language::Hi => "hi-IN",
        }
    }

    /// The other language. Used by the header toggle.
    pub fn toggled(&self) -> Language {
        match self {
            Language::En => Language::Hi,
            Language::Hi => Language::En,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = CounselorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" | "english" => Ok(Language::En),
            "hi" | "hi-in" | "hindi" => Ok(Language::Hi),
            other => Err(CounselorError::UnsupportedLanguage(other.to_string())),
        }
    }
}

/// Support-topic bucket used to select a canned response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Academic,
    Career,
    MentalHealth,
    StudyTips,
    /// Nothing matched.
    #[serde(rename = "default")]
    Default,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Academic,
        Category::Career,
        Category::MentalHealth,
        Category::StudyTips,
        Category::Default,
    ];

    /// Categories offered as quick prompts in the widget, in display order.
    pub const SUPPORT_TOPICS: [Category; 4] = [
        Category::Academic,
        Category::Career,
        Category::MentalHealth,
        Category::StudyTips,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Academic => "academic",
            Category::Career => "career",
            Category::MentalHealth => "mental-health",
            Category::StudyTips => "study-tips",
            Category::Default => "default",
        }
    }

    /// Human-readable topic label shown on the quick-prompt chips.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Academic => "Academic Support",
            Category::Career => "Career Guidance",
            Category::MentalHealth => "Mental Health",
            Category::StudyTips => "Study Tips",
            Category::Default => "General",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Author of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Assistant => write!(f, "assistant"),
        }
    }
}

// =============================================================================
// Newtype Wrappers - Identity
// =============================================================================

/// Per-conversation message identifier. Strictly increasing in append order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Entity Structs
// =============================================================================

/// A single entry of the conversation log.
///
/// Only the message store constructs these; once appended a message is
/// never modified or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    pub language: Language,
}

impl Message {
    pub fn is_from_assistant(&self) -> bool {
        self.sender == Sender::Assistant
    }
}

// =============================================================================
// Tests
// =============================================================================

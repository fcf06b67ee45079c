use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::AI_ASSISTANT_ID;

// Traveler id = the user's primary identity key, a free-form string
// chosen at registration ("user001", ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TravelerId(pub String);

impl TravelerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The reserved synthetic identity that answers AI conversations.
    pub fn assistant() -> Self {
        Self(AI_ASSISTANT_ID.to_string())
    }

    pub fn is_assistant(&self) -> bool {
        self.0 == AI_ASSISTANT_ID
    }
}

impl std::fmt::Display for TravelerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TravelerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct GroupId(pub Uuid);

impl GroupId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payload kind of a chat message.  The core only preserves the tag;
/// rendering is the presentation layer's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Text,
    Image,
    Voice,
    Emoji,
    Markdown,
    Chart,
    ContactCard,
}

/// How the presentation layer should render a message of a given kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderHint {
    Bubble,
    Thumbnail,
    AudioClip,
    Glyph,
    RichText,
    Figure,
    Card,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Image => "IMAGE",
            Self::Voice => "VOICE",
            Self::Emoji => "EMOJI",
            Self::Markdown => "MARKDOWN",
            Self::Chart => "CHART",
            Self::ContactCard => "CONTACT_CARD",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "TEXT" => Some(Self::Text),
            "IMAGE" => Some(Self::Image),
            "VOICE" => Some(Self::Voice),
            "EMOJI" => Some(Self::Emoji),
            "MARKDOWN" => Some(Self::Markdown),
            "CHART" => Some(Self::Chart),
            "CONTACT_CARD" => Some(Self::ContactCard),
            _ => None,
        }
    }

    /// Pure mapping from payload kind to rendering hint.
    pub fn render_hint(&self) -> RenderHint {
        match self {
            Self::Text => RenderHint::Bubble,
            Self::Image => RenderHint::Thumbnail,
            Self::Voice => RenderHint::AudioClip,
            Self::Emoji => RenderHint::Glyph,
            Self::Markdown => RenderHint::RichText,
            Self::Chart => RenderHint::Figure,
            Self::ContactCard => RenderHint::Card,
        }
    }

    /// Kinds whose content is a media reference rather than inline text.
    pub fn is_media(&self) -> bool {
        matches!(self, Self::Image | Self::Voice)
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tag_round_trip() {
        for kind in [
            MessageKind::Text,
            MessageKind::Image,
            MessageKind::Voice,
            MessageKind::Emoji,
            MessageKind::Markdown,
            MessageKind::Chart,
            MessageKind::ContactCard,
        ] {
            assert_eq!(MessageKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(MessageKind::from_str("VIDEO"), None);
    }

    #[test]
    fn media_kinds() {
        assert!(MessageKind::Image.is_media());
        assert!(MessageKind::Voice.is_media());
        assert!(!MessageKind::Markdown.is_media());
    }

    #[test]
    fn assistant_id_is_reserved() {
        assert!(TravelerId::assistant().is_assistant());
        assert!(!TravelerId::new("user001").is_assistant());
    }
}

//! # Topic Table
//!
//! Topics are posting modes that gate which validation, generation and
//! decoration rules apply to a post. The table is a plain immutable value
//! built once at startup and passed by reference into the validator.
//! Dispatch happens on the `TopicKind` tag, never through stored closures.

use serde::{Deserialize, Serialize};

/// Stable numeric identifier for a topic, as carried by post rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicId(pub i32);

impl std::fmt::Display for TopicId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Every posting mode the pipeline knows about. Each variant carries no
/// behavior; the validator matches on the tag and applies the rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TopicKind {
    Normal,
    EnglishOnly,
    KanjiOnly,
    Senryu,
    Anonymous,
    RandomDecoration,
    RandomLimit,
    Poll,
    AiGenerated,
    ImageOnly,
    MovaPic,
}

impl TopicKind {
    /// Length bounds must be rolled once before validation.
    pub fn needs_limit_params(self) -> bool {
        matches!(self, TopicKind::RandomLimit)
    }

    /// Per-line random HTML wrapping is applied after validation.
    pub fn decorates(self) -> bool {
        matches!(self, TopicKind::RandomDecoration)
    }

    /// Posting without a media file is a validation error.
    pub fn requires_attachment(self) -> bool {
        matches!(self, TopicKind::ImageOnly | TopicKind::MovaPic)
    }

    /// The sanitized text doubles as a caption burned into the image.
    pub fn composites_caption(self) -> bool {
        matches!(self, TopicKind::MovaPic)
    }

    /// Empty text is acceptable (the media carries the post).
    pub fn allows_empty_text(self) -> bool {
        matches!(self, TopicKind::ImageOnly | TopicKind::MovaPic)
    }
}

/// One row of the topic table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicPolicy {
    pub id: TopicId,
    pub name: String,
    pub kind: TopicKind,
}

/// The immutable topic registry. Constructed once, looked up by id.
#[derive(Debug, Clone)]
pub struct TopicRegistry {
    topics: Vec<TopicPolicy>,
}

impl TopicRegistry {
    pub fn new(topics: Vec<TopicPolicy>) -> Self {
        Self { topics }
    }

    /// The built-in posting modes.
    pub fn builtin() -> Self {
        let entry = |id: i32, name: &str, kind: TopicKind| TopicPolicy {
            id: TopicId(id),
            name: name.to_string(),
            kind,
        };
        Self::new(vec![
            entry(1, "normal", TopicKind::Normal),
            entry(2, "english-only", TopicKind::EnglishOnly),
            entry(3, "kanji-only", TopicKind::KanjiOnly),
            entry(4, "senryu", TopicKind::Senryu),
            entry(5, "anonymous", TopicKind::Anonymous),
            entry(6, "random-decoration", TopicKind::RandomDecoration),
            entry(7, "random-limit", TopicKind::RandomLimit),
            entry(8, "poll", TopicKind::Poll),
            entry(9, "ai-generated", TopicKind::AiGenerated),
            entry(10, "image-only", TopicKind::ImageOnly),
            entry(11, "mova-pic", TopicKind::MovaPic),
        ])
    }

    pub fn get(&self, id: TopicId) -> Option<&TopicPolicy> {
        self.topics.iter().find(|t| t.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TopicPolicy> {
        self.topics.iter()
    }
}

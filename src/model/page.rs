// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smol_str::SmolStr;

use super::ids::{PageSlug, SectionId};

/// The type tag of a section.
///
/// The set is closed; anything the editor does not know about round-trips as `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionKind {
    Hero,
    Features,
    Testimonials,
    Pricing,
    Gallery,
    About,
    Team,
    Faq,
    Cta,
    Contact,
    Footer,
    Custom(SmolStr),
}

impl SectionKind {
    pub const KNOWN: [SectionKind; 11] = [
        SectionKind::Hero,
        SectionKind::Features,
        SectionKind::Testimonials,
        SectionKind::Pricing,
        SectionKind::Gallery,
        SectionKind::About,
        SectionKind::Team,
        SectionKind::Faq,
        SectionKind::Cta,
        SectionKind::Contact,
        SectionKind::Footer,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Hero => "hero",
            Self::Features => "features",
            Self::Testimonials => "testimonials",
            Self::Pricing => "pricing",
            Self::Gallery => "gallery",
            Self::About => "about",
            Self::Team => "team",
            Self::Faq => "faq",
            Self::Cta => "cta",
            Self::Contact => "contact",
            Self::Footer => "footer",
            Self::Custom(tag) => tag.as_str(),
        }
    }

    /// Parses a stored type tag. Unknown tags become `Custom`.
    pub fn from_tag(tag: &str) -> Self {
        Self::KNOWN
            .iter()
            .find(|kind| kind.as_str() == tag)
            .cloned()
            .unwrap_or_else(|| Self::Custom(SmolStr::new(tag)))
    }

    /// Maps a word a user might type ("reviews", "testimonial", "call to action") to a kind.
    pub fn from_phrase(phrase: &str) -> Option<Self> {
        let phrase = phrase.trim().to_ascii_lowercase();
        let kind = match phrase.as_str() {
            "hero" | "banner" | "header" | "intro" => Self::Hero,
            "feature" | "features" | "services" | "service" | "benefits" => Self::Features,
            "testimonial" | "testimonials" | "reviews" | "review" | "quotes" => {
                Self::Testimonials
            }
            "pricing" | "prices" | "plans" | "price" => Self::Pricing,
            "gallery" | "portfolio" | "photos" | "images" => Self::Gallery,
            "about" | "about us" | "story" | "our story" => Self::About,
            "team" | "staff" | "people" => Self::Team,
            "faq" | "faqs" | "questions" => Self::Faq,
            "cta" | "call to action" | "call-to-action" => Self::Cta,
            "contact" | "contact us" | "contact form" => Self::Contact,
            "footer" => Self::Footer,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SectionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SectionKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from_tag(&tag))
    }
}

/// A primitive content value. Section payloads never nest deeper than one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl ContentValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Converts a JSON value if it is primitive. Arrays and objects are rejected.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => Some(Self::Null),
            serde_json::Value::Bool(value) => Some(Self::Bool(value)),
            serde_json::Value::Number(value) => Some(Self::Number(value)),
            serde_json::Value::String(value) => Some(Self::Text(value)),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }
}

impl From<&str> for ContentValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ContentValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for ContentValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ContentValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

pub type Content = BTreeMap<String, ContentValue>;

/// One addressable content block within a page layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    id: SectionId,
    kind: SectionKind,
    #[serde(default)]
    content: Content,
}

impl Section {
    pub fn new(id: SectionId, kind: SectionKind) -> Self {
        Self { id, kind, content: Content::new() }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<ContentValue>) -> Self {
        self.content.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> &SectionId {
        &self.id
    }

    pub fn kind(&self) -> &SectionKind {
        &self.kind
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut Content {
        &mut self.content
    }

    pub fn field(&self, key: &str) -> Option<&ContentValue> {
        self.content.get(key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(ContentValue::as_text)
    }

    /// Human-facing title: the first of `headline`, `title`, `heading` that is set.
    pub fn display_title(&self) -> Option<&str> {
        ["headline", "title", "heading"].into_iter().find_map(|key| self.text(key))
    }
}

/// A page owns an ordered layout of sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    slug: PageSlug,
    title: String,
    #[serde(default)]
    sections: Vec<Section>,
}

impl Page {
    pub fn new(slug: PageSlug, title: impl Into<String>) -> Self {
        Self { slug, title: title.into(), sections: Vec::new() }
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    pub fn slug(&self) -> &PageSlug {
        &self.slug
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn sections_mut(&mut self) -> &mut Vec<Section> {
        &mut self.sections
    }

    pub fn position_of(&self, section_id: &SectionId) -> Option<usize> {
        self.sections.iter().position(|section| section.id() == section_id)
    }
}

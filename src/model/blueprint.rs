// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{BlueprintId, PageSlug, SectionId};
use super::page::{ContentValue, Page, Section, SectionKind};

/// Named visual presets a theme can be switched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    Vibrant,
    Minimal,
    Elegant,
    Playful,
}

impl ThemeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Vibrant => "vibrant",
            Self::Minimal => "minimal",
            Self::Elegant => "elegant",
            Self::Playful => "playful",
        }
    }

    pub fn from_word(word: &str) -> Option<Self> {
        let mode = match word.trim().to_ascii_lowercase().as_str() {
            "light" | "bright" => Self::Light,
            "dark" | "night" => Self::Dark,
            "vibrant" | "bold" | "colorful" | "colourful" => Self::Vibrant,
            "minimal" | "minimalist" | "clean" | "simple" => Self::Minimal,
            "elegant" | "classy" | "luxurious" => Self::Elegant,
            "playful" | "fun" => Self::Playful,
            _ => return None,
        };
        Some(mode)
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSlot {
    Primary,
    Secondary,
    Accent,
}

impl ColorSlot {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Accent => "accent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub font: String,
    pub mode: ThemeMode,
}

impl Theme {
    pub fn color(&self, slot: ColorSlot) -> &str {
        match slot {
            ColorSlot::Primary => &self.primary,
            ColorSlot::Secondary => &self.secondary,
            ColorSlot::Accent => &self.accent,
        }
    }

    pub fn color_mut(&mut self, slot: ColorSlot) -> &mut String {
        match slot {
            ColorSlot::Primary => &mut self.primary,
            ColorSlot::Secondary => &mut self.secondary,
            ColorSlot::Accent => &mut self.accent,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: "#3b82f6".to_owned(),
            secondary: "#1e293b".to_owned(),
            accent: "#f59e0b".to_owned(),
            font: "Inter".to_owned(),
            mode: ThemeMode::Light,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    pub label: String,
    pub slug: PageSlug,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigation {
    #[serde(default)]
    pub items: Vec<NavItem>,
    #[serde(default)]
    pub sticky: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlueprintError {
    #[error("blueprint has no pages")]
    NoPages,
    #[error("home page '{slug}' does not exist")]
    MissingHomePage { slug: PageSlug },
    #[error("page stored under '{key}' declares slug '{slug}'")]
    SlugMismatch { key: PageSlug, slug: PageSlug },
    #[error("section id '{section_id}' is used more than once")]
    DuplicateSectionId { section_id: SectionId },
}

/// The full structured document describing a generated website.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blueprint {
    id: BlueprintId,
    name: String,
    #[serde(default)]
    theme: Theme,
    #[serde(default)]
    navigation: Navigation,
    pages: BTreeMap<PageSlug, Page>,
    home_page: PageSlug,
    #[serde(default)]
    metadata: BTreeMap<String, ContentValue>,
    updated_at: DateTime<Utc>,
}

impl Blueprint {
    pub fn new(id: BlueprintId, name: impl Into<String>, theme: Theme, home: Page) -> Self {
        let home_page = home.slug().clone();
        let navigation = Navigation {
            items: vec![NavItem { label: home.title().to_owned(), slug: home_page.clone() }],
            sticky: false,
        };
        let mut pages = BTreeMap::new();
        pages.insert(home_page.clone(), home);
        Self {
            id,
            name: name.into(),
            theme,
            navigation,
            pages,
            home_page,
            metadata: BTreeMap::new(),
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    pub fn id(&self) -> &BlueprintId {
        &self.id
    }

    pub fn set_id(&mut self, id: BlueprintId) {
        self.id = id;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn theme_mut(&mut self) -> &mut Theme {
        &mut self.theme
    }

    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    pub fn navigation_mut(&mut self) -> &mut Navigation {
        &mut self.navigation
    }

    pub fn pages(&self) -> &BTreeMap<PageSlug, Page> {
        &self.pages
    }

    pub fn page(&self, slug: &PageSlug) -> Option<&Page> {
        self.pages.get(slug)
    }

    pub fn page_mut(&mut self, slug: &PageSlug) -> Option<&mut Page> {
        self.pages.get_mut(slug)
    }

    /// Adds a page and links it from the navigation. Replaces an existing page with the same slug.
    pub fn insert_page(&mut self, page: Page) {
        let slug = page.slug().clone();
        if !self.navigation.items.iter().any(|item| item.slug == slug) {
            self.navigation.items.push(NavItem { label: page.title().to_owned(), slug: slug.clone() });
        }
        self.pages.insert(slug, page);
    }

    pub fn home_page_slug(&self) -> &PageSlug {
        &self.home_page
    }

    /// Makes `slug` the home page. Returns `false` if there is no such page.
    pub fn set_home_page(&mut self, slug: &PageSlug) -> bool {
        if !self.pages.contains_key(slug) {
            return false;
        }
        self.home_page = slug.clone();
        true
    }

    pub fn home_page(&self) -> Option<&Page> {
        self.pages.get(&self.home_page)
    }

    pub fn metadata(&self) -> &BTreeMap<String, ContentValue> {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut BTreeMap<String, ContentValue> {
        &mut self.metadata
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }

    /// Pages in display order: home page first, then the rest by slug.
    pub fn pages_in_order(&self) -> impl Iterator<Item = &Page> {
        self.home_page().into_iter().chain(
            self.pages.values().filter(move |page| page.slug() != &self.home_page),
        )
    }

    /// Every section of the document, home page first, each page in layout order.
    pub fn sections(&self) -> impl Iterator<Item = (&Page, &Section)> {
        self.pages_in_order()
            .flat_map(|page| page.sections().iter().map(move |section| (page, section)))
    }

    pub fn find_section(&self, section_id: &SectionId) -> Option<(&PageSlug, usize, &Section)> {
        self.pages.values().find_map(|page| {
            page.position_of(section_id)
                .map(|index| (page.slug(), index, &page.sections()[index]))
        })
    }

    pub fn find_section_mut(&mut self, section_id: &SectionId) -> Option<&mut Section> {
        self.pages
            .values_mut()
            .flat_map(|page| page.sections_mut().iter_mut())
            .find(|section| section.id() == section_id)
    }

    /// First section with the given kind, searching the home page first.
    pub fn first_section_of_kind(&self, kind: &SectionKind) -> Option<&Section> {
        self.sections().map(|(_, section)| section).find(|section| section.kind() == kind)
    }

    pub fn section_ids(&self) -> BTreeSet<SectionId> {
        self.sections().map(|(_, section)| section.id().clone()).collect()
    }

    /// Returns a section id that is not used anywhere in the document.
    pub fn allocate_section_id(&self, kind: &SectionKind) -> SectionId {
        let base = kind.as_str();
        let used = self.section_ids();

        let mut buffer = itoa::Buffer::new();
        for idx in 1u64.. {
            let candidate = format!("{base}-{}", buffer.format(idx));
            if !used.contains(candidate.as_str()) {
                if let Ok(id) = SectionId::new(candidate) {
                    return id;
                }
            }
        }

        unreachable!("exhausted section id space")
    }

    pub fn validate(&self) -> Result<(), BlueprintError> {
        if self.pages.is_empty() {
            return Err(BlueprintError::NoPages);
        }
        if !self.pages.contains_key(&self.home_page) {
            return Err(BlueprintError::MissingHomePage { slug: self.home_page.clone() });
        }

        let mut seen = BTreeSet::new();
        for (key, page) in &self.pages {
            if key != page.slug() {
                return Err(BlueprintError::SlugMismatch {
                    key: key.clone(),
                    slug: page.slug().clone(),
                });
            }
            for section in page.sections() {
                if !seen.insert(section.id()) {
                    return Err(BlueprintError::DuplicateSectionId {
                        section_id: section.id().clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

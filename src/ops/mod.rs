// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Structural edit operations for blueprints.
//!
//! Operations are applied copy-on-write: `apply_ops` clones the input once, applies every op in
//! order and either returns the new document or an error with the input untouched. The result
//! carries a minimal delta that callers use to detect no-op edits and to find the section an
//! edit touched.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::{
    Blueprint, ColorSlot, ContentValue, PageSlug, Section, SectionId, ThemeMode,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum Op {
    Theme(ThemeOp),
    Section(SectionOp),
    Document(DocumentOp),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ThemeOp {
    SetColor { slot: ColorSlot, value: String },
    SetFont { font: String },
    SetMode { mode: ThemeMode },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SectionOp {
    SetField { section_id: SectionId, key: String, value: ContentValue },
    RemoveField { section_id: SectionId, key: String },
    Move { section_id: SectionId, to_index: usize },
    Insert { page: PageSlug, index: usize, section: Section },
    Remove { section_id: SectionId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DocumentOp {
    Rename { name: String },
    SetMetadata { key: String, value: Option<ContentValue> },
    ReplaceText { find: String, replace: String },
    SetPageTitle { page: PageSlug, title: String },
    SetHomePage { page: PageSlug },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyResult {
    pub document: Blueprint,
    pub applied: usize,
    pub delta: Delta,
}

/// Minimal delta describing what changed as the result of applying ops.
///
/// Section changes are reported by id; theme, document-level fields (name, metadata,
/// navigation) and the page set (slugs, titles, home page) are reported as flags.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Delta {
    pub added: Vec<SectionId>,
    pub removed: Vec<SectionId>,
    pub updated: Vec<SectionId>,
    pub theme: bool,
    pub document: bool,
    #[serde(default)]
    pub pages: bool,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.updated.is_empty()
            && !self.theme
            && !self.document
            && !self.pages
    }

    /// The section an edit was about: the first updated one, else the first added one.
    pub fn focus(&self) -> Option<&SectionId> {
        self.updated.first().or_else(|| self.added.first())
    }
}

#[derive(Debug, Default)]
struct DeltaBuilder {
    added: HashSet<SectionId>,
    removed: HashSet<SectionId>,
    updated: HashSet<SectionId>,
    // Updates in first-touched order so `Delta::focus` is deterministic.
    update_order: Vec<SectionId>,
    theme: bool,
    document: bool,
    pages: bool,
}

impl DeltaBuilder {
    fn record_added(&mut self, section_id: SectionId) {
        if self.removed.remove(&section_id) {
            // Removed then re-inserted under the same id within one batch.
            self.record_updated(section_id);
            return;
        }
        self.added.insert(section_id);
    }

    fn record_removed(&mut self, section_id: SectionId) {
        self.updated.remove(&section_id);
        self.update_order.retain(|id| id != &section_id);
        if self.added.remove(&section_id) {
            return;
        }
        self.removed.insert(section_id);
    }

    fn record_updated(&mut self, section_id: SectionId) {
        if self.added.contains(&section_id) || self.removed.contains(&section_id) {
            return;
        }
        if self.updated.insert(section_id.clone()) {
            self.update_order.push(section_id);
        }
    }

    fn record_theme(&mut self) {
        self.theme = true;
    }

    fn record_document(&mut self) {
        self.document = true;
    }

    fn record_pages(&mut self) {
        self.pages = true;
    }

    fn finish(self) -> Delta {
        let mut added = self.added.into_iter().collect::<Vec<_>>();
        let mut removed = self.removed.into_iter().collect::<Vec<_>>();
        added.sort();
        removed.sort();

        Delta {
            added,
            removed,
            updated: self.update_order,
            theme: self.theme,
            document: self.document,
            pages: self.pages,
        }
    }
}

pub fn apply_ops(document: &Blueprint, ops: &[Op]) -> Result<ApplyResult, ApplyError> {
    if ops.is_empty() {
        return Ok(ApplyResult { document: document.clone(), applied: 0, delta: Delta::default() });
    }

    let mut next = document.clone();
    let mut delta = DeltaBuilder::default();

    for op in ops {
        match op {
            Op::Theme(theme_op) => apply_theme_op(&mut next, theme_op, &mut delta)?,
            Op::Section(section_op) => apply_section_op(&mut next, section_op, &mut delta)?,
            Op::Document(document_op) => apply_document_op(&mut next, document_op, &mut delta)?,
        }
    }

    Ok(ApplyResult { document: next, applied: ops.len(), delta: delta.finish() })
}

/// Computes the delta between two documents produced independently (remote output, reverts).
pub fn diff(before: &Blueprint, after: &Blueprint) -> Delta {
    let mut delta = DeltaBuilder::default();

    let before_ids = before.section_ids();
    let after_ids = after.section_ids();

    for (page, section) in after.sections() {
        match before.find_section(section.id()) {
            None => delta.record_added(section.id().clone()),
            Some((before_page, before_index, before_section)) => {
                let moved = before_page != page.slug()
                    || page.position_of(section.id()) != Some(before_index);
                if moved || before_section != section {
                    delta.record_updated(section.id().clone());
                }
            }
        }
    }
    for removed in before_ids.difference(&after_ids) {
        delta.record_removed(removed.clone());
    }

    if before.theme() != after.theme() {
        delta.record_theme();
    }
    if before.name() != after.name()
        || before.metadata() != after.metadata()
        || before.navigation() != after.navigation()
    {
        delta.record_document();
    }
    let same_pages = before.home_page_slug() == after.home_page_slug()
        && before.pages().len() == after.pages().len()
        && before.pages().iter().zip(after.pages()).all(|((slug, page), (other_slug, other))| {
            slug == other_slug && page.title() == other.title()
        });
    if !same_pages {
        delta.record_pages();
    }

    delta.finish()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    #[error("section not found (id={section_id})")]
    SectionNotFound { section_id: SectionId },
    #[error("page not found (slug={slug})")]
    PageNotFound { slug: PageSlug },
    #[error("section id '{section_id}' already exists")]
    DuplicateSectionId { section_id: SectionId },
    #[error("index {index} is out of range for a layout of {len} sections")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("invalid color '{value}' (expected #rgb or #rrggbb)")]
    InvalidColor { value: String },
    #[error("text to replace must not be empty")]
    EmptySearchText,
}

// Extracted op-application implementation for theme/section/document mutations.
include!("ops_impl.rs");

#[cfg(test)]
mod tests;

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// Theme/section/document mutation helpers used by `apply_ops`.
/// Keeps `ops::mod` focused on public op types and orchestration.
fn apply_theme_op(
    document: &mut Blueprint,
    op: &ThemeOp,
    delta: &mut DeltaBuilder,
) -> Result<(), ApplyError> {
    let theme = document.theme_mut();
    match op {
        ThemeOp::SetColor { slot, value } => {
            let value = normalize_color(value)?;
            let current = theme.color_mut(*slot);
            if *current != value {
                *current = value;
                delta.record_theme();
            }
        }
        ThemeOp::SetFont { font } => {
            let font = font.trim();
            if theme.font != font {
                theme.font = font.to_owned();
                delta.record_theme();
            }
        }
        ThemeOp::SetMode { mode } => {
            if theme.mode != *mode {
                theme.mode = *mode;
                delta.record_theme();
            }
        }
    }
    Ok(())
}

fn apply_section_op(
    document: &mut Blueprint,
    op: &SectionOp,
    delta: &mut DeltaBuilder,
) -> Result<(), ApplyError> {
    match op {
        SectionOp::SetField { section_id, key, value } => {
            let section = document
                .find_section_mut(section_id)
                .ok_or_else(|| ApplyError::SectionNotFound { section_id: section_id.clone() })?;
            if section.field(key) != Some(value) {
                section.content_mut().insert(key.clone(), value.clone());
                delta.record_updated(section_id.clone());
            }
            Ok(())
        }
        SectionOp::RemoveField { section_id, key } => {
            let section = document
                .find_section_mut(section_id)
                .ok_or_else(|| ApplyError::SectionNotFound { section_id: section_id.clone() })?;
            if section.content_mut().remove(key).is_some() {
                delta.record_updated(section_id.clone());
            }
            Ok(())
        }
        SectionOp::Move { section_id, to_index } => {
            let Some((slug, from_index, _)) = document.find_section(section_id) else {
                return Err(ApplyError::SectionNotFound { section_id: section_id.clone() });
            };
            let slug = slug.clone();
            let page = document
                .page_mut(&slug)
                .ok_or_else(|| ApplyError::PageNotFound { slug: slug.clone() })?;
            let len = page.sections().len();
            if *to_index >= len {
                return Err(ApplyError::IndexOutOfRange { index: *to_index, len });
            }
            if from_index != *to_index {
                let section = page.sections_mut().remove(from_index);
                page.sections_mut().insert(*to_index, section);
                delta.record_updated(section_id.clone());
            }
            Ok(())
        }
        SectionOp::Insert { page, index, section } => {
            if document.find_section(section.id()).is_some() {
                return Err(ApplyError::DuplicateSectionId { section_id: section.id().clone() });
            }
            let target = document
                .page_mut(page)
                .ok_or_else(|| ApplyError::PageNotFound { slug: page.clone() })?;
            let len = target.sections().len();
            if *index > len {
                return Err(ApplyError::IndexOutOfRange { index: *index, len });
            }
            target.sections_mut().insert(*index, section.clone());
            delta.record_added(section.id().clone());
            Ok(())
        }
        SectionOp::Remove { section_id } => {
            let Some((slug, index, _)) = document.find_section(section_id) else {
                return Err(ApplyError::SectionNotFound { section_id: section_id.clone() });
            };
            let slug = slug.clone();
            if let Some(page) = document.page_mut(&slug) {
                page.sections_mut().remove(index);
            }
            delta.record_removed(section_id.clone());
            Ok(())
        }
    }
}

fn apply_document_op(
    document: &mut Blueprint,
    op: &DocumentOp,
    delta: &mut DeltaBuilder,
) -> Result<(), ApplyError> {
    match op {
        DocumentOp::Rename { name } => {
            let name = name.trim();
            if document.name() != name {
                document.set_name(name);
                delta.record_document();
            }
        }
        DocumentOp::SetMetadata { key, value } => {
            let changed = match value {
                Some(value) => {
                    document.metadata_mut().insert(key.clone(), value.clone()).as_ref() != Some(value)
                }
                None => document.metadata_mut().remove(key).is_some(),
            };
            if changed {
                delta.record_document();
            }
        }
        DocumentOp::ReplaceText { find, replace } => {
            if find.is_empty() {
                return Err(ApplyError::EmptySearchText);
            }
            let section_ids = document.section_ids();
            for section_id in section_ids {
                let Some(section) = document.find_section_mut(&section_id) else {
                    continue;
                };
                let mut touched = false;
                for value in section.content_mut().values_mut() {
                    if let ContentValue::Text(text) = value {
                        if text.contains(find.as_str()) {
                            *text = text.replace(find.as_str(), replace);
                            touched = true;
                        }
                    }
                }
                if touched {
                    delta.record_updated(section_id);
                }
            }
        }
        DocumentOp::SetPageTitle { page, title } => {
            let target = document
                .page_mut(page)
                .ok_or_else(|| ApplyError::PageNotFound { slug: page.clone() })?;
            if target.title() != title {
                target.set_title(title.as_str());
                delta.record_pages();
            }
        }
        DocumentOp::SetHomePage { page } => {
            if document.home_page_slug() != page {
                if !document.set_home_page(page) {
                    return Err(ApplyError::PageNotFound { slug: page.clone() });
                }
                delta.record_pages();
            }
        }
    }
    Ok(())
}

/// Lowercases and validates a `#rgb` / `#rrggbb` color.
pub fn normalize_color(raw: &str) -> Result<String, ApplyError> {
    let trimmed = raw.trim();
    let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
    let valid = matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(ApplyError::InvalidColor { value: raw.to_owned() });
    }
    Ok(format!("#{}", hex.to_ascii_lowercase()))
}

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Asset references embedded in a blueprint.
//!
//! Any absolute `http(s)` URL stored in section content or document metadata is an asset
//! reference. A reference is *owned* when its path contains `/<namespace>/<blueprint_id>/`;
//! only owned references are ever garbage-collected.

use std::collections::BTreeSet;

use url::Url;

use super::blueprint::Blueprint;
use super::ids::{BlueprintId, SectionId};
use super::page::ContentValue;

pub const DEFAULT_ASSET_NAMESPACE: &str = "blueprint-assets";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetNamespace {
    segment: String,
}

impl AssetNamespace {
    pub fn new(segment: impl Into<String>) -> Self {
        let segment = segment.into();
        Self { segment: segment.trim_matches('/').to_owned() }
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Relative object path for a file uploaded for `blueprint_id`.
    pub fn object_path(&self, blueprint_id: &BlueprintId, file_name: &str) -> String {
        format!("{}/{}/{}", self.segment, blueprint_id, file_name)
    }

    pub fn owns(&self, blueprint_id: &BlueprintId, url: &str) -> bool {
        let Some(url) = parse_asset_url(url) else {
            return false;
        };
        let Some(segments) = url.path_segments() else {
            return false;
        };

        let segments = segments.collect::<Vec<_>>();
        segments.windows(3).any(|window| {
            window[0] == self.segment && window[1] == blueprint_id.as_str() && !window[2].is_empty()
        })
    }
}

impl Default for AssetNamespace {
    fn default() -> Self {
        Self::new(DEFAULT_ASSET_NAMESPACE)
    }
}

/// Where an asset reference lives inside the document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum AssetSlot {
    Section { section_id: SectionId, key: String },
    Metadata { key: String },
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct AssetRef {
    pub slot: AssetSlot,
    pub url: String,
}

pub fn parse_asset_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

fn url_value(value: &ContentValue) -> Option<&str> {
    value.as_text().filter(|text| parse_asset_url(text).is_some())
}

/// All asset references in document order.
pub fn asset_refs(blueprint: &Blueprint) -> Vec<AssetRef> {
    let mut refs = Vec::new();
    for (_, section) in blueprint.sections() {
        for (key, value) in section.content() {
            if let Some(url) = url_value(value) {
                refs.push(AssetRef {
                    slot: AssetSlot::Section { section_id: section.id().clone(), key: key.clone() },
                    url: url.to_owned(),
                });
            }
        }
    }
    for (key, value) in blueprint.metadata() {
        if let Some(url) = url_value(value) {
            refs.push(AssetRef { slot: AssetSlot::Metadata { key: key.clone() }, url: url.to_owned() });
        }
    }
    refs
}

pub fn asset_urls(blueprint: &Blueprint) -> BTreeSet<String> {
    asset_refs(blueprint).into_iter().map(|asset| asset.url).collect()
}

#[cfg(test)]
mod tests {
    use super::{asset_refs, asset_urls, AssetNamespace, AssetSlot};
    use crate::model::fixtures::{owned_asset_url, sample_blueprint};
    use crate::model::{BlueprintId, ContentValue, SectionId};

    #[test]
    fn namespace_owns_only_its_blueprint_paths() {
        let namespace = AssetNamespace::default();
        let id = BlueprintId::new("bp-1").expect("id");
        let other = BlueprintId::new("bp-2").expect("id");

        let url = owned_asset_url(&id, "hero.png");
        assert!(namespace.owns(&id, &url));
        assert!(!namespace.owns(&other, &url));
        assert!(!namespace.owns(&id, "https://images.example.org/stock/hero.png"));
        assert!(!namespace.owns(&id, "not a url"));
        assert!(!namespace.owns(&id, "https://cdn.example.com/blueprint-assets/bp-1/"));
    }

    #[test]
    fn asset_urls_collects_sections_and_metadata() {
        let mut blueprint = sample_blueprint();
        blueprint
            .metadata_mut()
            .insert("ogImage".to_owned(), ContentValue::from("https://cdn.example.com/og.png"));

        let urls = asset_urls(&blueprint);
        assert!(urls.contains("https://cdn.example.com/og.png"));
        assert!(urls.iter().any(|url| url.ends_with("/hero.jpg")));
        assert!(!urls.contains("Welcome"));
    }

    #[test]
    fn asset_refs_name_their_slots() {
        let blueprint = sample_blueprint();
        let refs = asset_refs(&blueprint);
        assert_eq!(refs.len(), 1);
        assert_eq!(
            refs[0].slot,
            AssetSlot::Section {
                section_id: SectionId::new("hero-1").expect("id"),
                key: "image".to_owned(),
            }
        );
    }
}

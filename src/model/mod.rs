// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core document model.
//!
//! A blueprint contains pages keyed by slug; each page owns an ordered layout of sections whose
//! ids are unique across the whole document. The model is plain data: every value can be cloned
//! and serialized without loss.

pub mod asset;
pub mod blueprint;
pub mod fixtures;
pub mod ids;
pub mod page;

pub use asset::{asset_refs, asset_urls, AssetNamespace, AssetRef, AssetSlot};
pub use blueprint::{Blueprint, BlueprintError, ColorSlot, NavItem, Navigation, Theme, ThemeMode};
pub use ids::{BlueprintId, Id, IdError, PageSlug, RecordId, SectionId};
pub use page::{Content, ContentValue, Page, Section, SectionKind};

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Asset lifecycle: garbage-collects uploaded files that no document version still uses.
//!
//! An owned asset stays on disk while the current document or any undo/redo snapshot references
//! it. It is deleted once it drops out of all of them, which happens when a commit evicts the
//! oldest undo entry or clears the redo stack, or when the session closes. Deletions run in the
//! background and never hold up or fail the edit that caused them.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinSet;

use crate::model::{asset_urls, AssetNamespace, Blueprint, BlueprintId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    #[error("invalid asset file name '{name}'")]
    InvalidFileName { name: String },
    #[error("asset not found: {url}")]
    NotFound { url: String },
    #[error("asset url is not served by this storage: {url}")]
    Foreign { url: String },
    #[error("asset storage error: {message}")]
    Io { message: String },
}

/// Storage for uploaded files.
#[async_trait]
pub trait AssetStorage: Send + Sync {
    /// Stores `bytes` for `blueprint_id` and returns the public URL.
    async fn upload(
        &self,
        blueprint_id: &BlueprintId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, AssetError>;

    /// Best-effort deletion. Deleting a missing asset may return `NotFound` or `Ok`.
    async fn delete(&self, url: &str) -> Result<(), AssetError>;
}

/// Returns the trimmed file name if it is a single safe path segment.
pub fn validate_file_name(name: &str) -> Result<&str, AssetError> {
    let trimmed = name.trim();
    let invalid = trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.starts_with('.')
        || trimmed.chars().any(|c| matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_control());
    if invalid {
        return Err(AssetError::InvalidFileName { name: name.to_owned() });
    }
    Ok(trimmed)
}

pub struct AssetLifecycle {
    storage: Arc<dyn AssetStorage>,
    namespace: AssetNamespace,
    pending: JoinSet<()>,
}

impl AssetLifecycle {
    pub fn new(storage: Arc<dyn AssetStorage>, namespace: AssetNamespace) -> Self {
        Self { storage, namespace, pending: JoinSet::new() }
    }

    pub fn namespace(&self) -> &AssetNamespace {
        &self.namespace
    }

    pub fn storage(&self) -> &Arc<dyn AssetStorage> {
        &self.storage
    }

    /// Deletions spawned and not yet awaited by [`AssetLifecycle::settle`].
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Owned asset URLs referenced by any of `documents`.
    pub fn owned_urls<'a>(
        &self,
        documents: impl IntoIterator<Item = &'a Blueprint>,
    ) -> BTreeSet<String> {
        documents
            .into_iter()
            .flat_map(|document| {
                asset_urls(document)
                    .into_iter()
                    .filter(move |url| self.namespace.owns(document.id(), url))
            })
            .collect()
    }

    /// Schedules deletion of `old_url` if it is owned by `blueprint_id`'s namespace, differs from
    /// `new_url` and is not in `still_referenced`. Returns whether a deletion was scheduled.
    pub fn on_asset_replaced(
        &mut self,
        blueprint_id: &BlueprintId,
        old_url: &str,
        new_url: &str,
        still_referenced: &BTreeSet<String>,
    ) -> bool {
        let old_url = old_url.trim();
        if old_url.is_empty() || old_url == new_url.trim() {
            return false;
        }
        if !self.namespace.owns(blueprint_id, old_url) {
            tracing::debug!(url = %old_url, "keeping external asset");
            return false;
        }
        if still_referenced.contains(old_url) {
            tracing::debug!(url = %old_url, "asset still referenced");
            return false;
        }

        self.spawn_delete(old_url.to_owned());
        true
    }

    /// Deletes every owned URL in `before` that is missing from `after`.
    ///
    /// Both sets come from [`AssetLifecycle::owned_urls`] over every version that can still
    /// become current, so a URL is deleted exactly once, when its last reference goes away.
    pub fn reconcile(
        &mut self,
        blueprint_id: &BlueprintId,
        before: &BTreeSet<String>,
        after: &BTreeSet<String>,
    ) -> usize {
        let mut scheduled = 0;
        for url in before.difference(after) {
            if self.on_asset_replaced(blueprint_id, url, "", after) {
                scheduled += 1;
            }
        }
        scheduled
    }

    /// Waits for every scheduled deletion to finish.
    pub async fn settle(&mut self) {
        while let Some(result) = self.pending.join_next().await {
            if let Err(err) = result {
                tracing::warn!(%err, "asset deletion task failed");
            }
        }
    }

    fn spawn_delete(&mut self, url: String) {
        let storage = self.storage.clone();
        self.pending.spawn(async move {
            match storage.delete(&url).await {
                Ok(()) => tracing::info!(%url, "deleted orphaned asset"),
                Err(AssetError::NotFound { .. }) => tracing::debug!(%url, "orphaned asset already gone"),
                Err(err) => tracing::warn!(%url, %err, "failed to delete orphaned asset"),
            }
        });
    }
}

impl std::fmt::Debug for AssetLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetLifecycle")
            .field("namespace", &self.namespace)
            .field("pending", &self.pending.len())
            .finish()
    }
}

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use url::Url;

use super::{safe_segment, write_atomic, StoreError, WriteDurability};
use crate::assets::{validate_file_name, AssetError, AssetStorage};
use crate::model::{AssetNamespace, BlueprintId};

/// Replaces every character outside `[A-Za-z0-9._-]` with `-` so the name is usable verbatim
/// in both a path and a URL.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '-' })
        .collect()
}

/// Stores uploads under `<root>/<namespace>/<blueprint-id>/<file>` and hands out URLs below
/// `base_url`.
#[derive(Debug, Clone)]
pub struct FolderAssets {
    root: PathBuf,
    base_url: Url,
    namespace: AssetNamespace,
    durability: WriteDurability,
}

impl FolderAssets {
    pub fn new(root: impl Into<PathBuf>, base_url: Url, namespace: AssetNamespace) -> Self {
        Self { root: root.into(), base_url, namespace, durability: WriteDurability::default() }
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn base_prefix(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn url_for(&self, blueprint_id: &BlueprintId, file_name: &str) -> String {
        format!("{}/{}", self.base_prefix(), self.namespace.object_path(blueprint_id, file_name))
    }

    /// Maps a path relative to the base URL (`<namespace>/<blueprint-id>/<file>`) to a file
    /// under the root. Anything else is `None`.
    pub fn resolve_relative(&self, relative: &str) -> Option<PathBuf> {
        let segments = relative.trim_matches('/').split('/').collect::<Vec<_>>();
        let [namespace, blueprint_id, file_name] = segments.as_slice() else {
            return None;
        };
        if *namespace != self.namespace.segment() {
            return None;
        }
        safe_segment("blueprint id", blueprint_id).ok()?;
        safe_segment("file name", file_name).ok()?;
        Some(self.root.join(namespace).join(blueprint_id).join(file_name))
    }

    /// File backing `url`, if the URL is served by this storage.
    pub fn path_for_url(&self, url: &str) -> Result<PathBuf, AssetError> {
        let foreign = || AssetError::Foreign { url: url.to_owned() };
        let relative = url.trim().strip_prefix(self.base_prefix()).ok_or_else(foreign)?;
        if !relative.starts_with('/') {
            return Err(foreign());
        }
        let relative = relative.split(['?', '#']).next().unwrap_or_default();
        self.resolve_relative(relative).ok_or_else(foreign)
    }

    fn write_upload(&self, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        write_atomic(path, bytes, self.durability)
    }
}

fn io_error(err: StoreError) -> AssetError {
    AssetError::Io { message: err.to_string() }
}

#[async_trait]
impl AssetStorage for FolderAssets {
    async fn upload(
        &self,
        blueprint_id: &BlueprintId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, AssetError> {
        let file_name = sanitize_file_name(validate_file_name(file_name)?);
        let blueprint_segment = safe_segment("blueprint id", blueprint_id.as_str()).map_err(io_error)?;
        let path = self
            .root
            .join(self.namespace.segment())
            .join(blueprint_segment)
            .join(&file_name);

        let storage = self.clone();
        let contents = bytes.to_vec();
        let target = path.clone();
        tokio::task::spawn_blocking(move || storage.write_upload(&target, &contents))
            .await
            .map_err(|err| AssetError::Io { message: err.to_string() })?
            .map_err(io_error)?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "stored asset");
        Ok(self.url_for(blueprint_id, &file_name))
    }

    async fn delete(&self, url: &str) -> Result<(), AssetError> {
        let path = self.path_for_url(url)?;
        let target = path.clone();
        let result = tokio::task::spawn_blocking(move || fs::remove_file(&target))
            .await
            .map_err(|err| AssetError::Io { message: err.to_string() })?;
        match result {
            Ok(()) => Ok(()),
            // Already gone.
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(io_error(StoreError::io(&path, source))),
        }
    }
}

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
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{safe_segment, write_atomic, StoreError, WriteDurability};
use crate::model::{Blueprint, RecordId};
use crate::persist::{PersistError, PersistenceService, SaveMeta};

const RECORDS_DIR: &str = "records";
const RECORD_EXT: &str = "json";

/// One saved blueprint as written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    pub id: RecordId,
    pub meta: SaveMeta,
    pub document: Blueprint,
}

/// Saves blueprints as JSON records in a workspace directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderStore {
    root: PathBuf,
    durability: WriteDurability,
}

impl FolderStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), durability: WriteDurability::default() }
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn durability(&self) -> WriteDurability {
        self.durability
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn records_dir(&self) -> PathBuf {
        self.root.join(RECORDS_DIR)
    }

    pub fn record_path(&self, record_id: &RecordId) -> Result<PathBuf, StoreError> {
        let segment = safe_segment("record id", record_id.as_str())?;
        Ok(self.records_dir().join(format!("{segment}.{RECORD_EXT}")))
    }

    pub fn load(&self, record_id: &RecordId) -> Result<StoredRecord, StoreError> {
        let path = self.record_path(record_id)?;
        let bytes = fs::read(&path).map_err(|source| StoreError::io(&path, source))?;
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Json { path, source })
    }

    /// Record ids present in the workspace, sorted. A missing records directory is empty.
    pub fn list(&self) -> Result<Vec<RecordId>, StoreError> {
        let dir = self.records_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::io(&dir, source)),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::io(&dir, source))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXT) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if stem.starts_with('.') {
                continue;
            }
            match RecordId::new(stem) {
                Ok(id) => ids.push(id),
                Err(err) => tracing::debug!(path = %path.display(), %err, "skipping record file"),
            }
        }
        ids.sort();
        Ok(ids)
    }

    pub fn write(&self, record: &StoredRecord) -> Result<(), StoreError> {
        let path = self.record_path(&record.id)?;
        let mut json = serde_json::to_vec_pretty(record)
            .map_err(|source| StoreError::Json { path: path.clone(), source })?;
        json.push(b'\n');
        write_atomic(&path, &json, self.durability)
    }

    async fn write_blocking(&self, record: StoredRecord) -> Result<RecordId, PersistError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || {
            store.write(&record)?;
            Ok::<_, StoreError>(record.id)
        })
        .await
        .map_err(|err| PersistError::Failed { message: err.to_string() })?
        .map_err(PersistError::from)
    }
}

#[async_trait]
impl PersistenceService for FolderStore {
    async fn create(&self, document: &Blueprint, meta: &SaveMeta) -> Result<RecordId, PersistError> {
        let id = RecordId::new(Uuid::new_v4().to_string())
            .map_err(|err| PersistError::Failed { message: err.to_string() })?;
        let record = StoredRecord { id, meta: meta.clone(), document: document.clone() };
        self.write_blocking(record).await
    }

    async fn update(
        &self,
        record_id: &RecordId,
        document: &Blueprint,
        meta: &SaveMeta,
    ) -> Result<RecordId, PersistError> {
        let record =
            StoredRecord { id: record_id.clone(), meta: meta.clone(), document: document.clone() };
        self.write_blocking(record).await
    }
}

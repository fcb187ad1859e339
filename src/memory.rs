// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! In-memory implementations of the external services.
//!
//! Used by tests and benches, and by `--demo` sessions that should not touch the disk. Each one
//! records the calls it received.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::assets::{AssetError, AssetStorage};
use crate::model::{AssetNamespace, Blueprint, BlueprintId, RecordId};
use crate::persist::{PersistError, PersistenceService, SaveMeta};
use crate::preview::{PreviewChannel, PreviewMessage};
use crate::resolve::{BusinessContext, GenerationError, RemoteGenerator};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKind {
    Create,
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveCall {
    pub kind: SaveKind,
    pub record_id: RecordId,
    pub document: Blueprint,
    pub meta: SaveMeta,
}

#[derive(Debug, Default)]
struct PersistenceState {
    records: BTreeMap<RecordId, Blueprint>,
    calls: Vec<SaveCall>,
    failures: VecDeque<PersistError>,
    next_id: u64,
}

#[derive(Debug, Default)]
pub struct MemoryPersistence {
    state: Mutex<PersistenceState>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next save call fails with `error`.
    pub fn fail_next(&self, error: PersistError) {
        lock(&self.state).failures.push_back(error);
    }

    pub fn calls(&self) -> Vec<SaveCall> {
        lock(&self.state).calls.clone()
    }

    pub fn record(&self, record_id: &RecordId) -> Option<Blueprint> {
        lock(&self.state).records.get(record_id).cloned()
    }

    fn store(
        &self,
        kind: SaveKind,
        record_id: Option<&RecordId>,
        document: &Blueprint,
        meta: &SaveMeta,
    ) -> Result<RecordId, PersistError> {
        let mut state = lock(&self.state);
        if let Some(error) = state.failures.pop_front() {
            return Err(error);
        }
        let record_id = match record_id {
            Some(record_id) => record_id.clone(),
            None => {
                state.next_id += 1;
                RecordId::new(format!("rec-{}", state.next_id))
                    .map_err(|err| PersistError::Failed { message: err.to_string() })?
            }
        };
        state.records.insert(record_id.clone(), document.clone());
        state.calls.push(SaveCall {
            kind,
            record_id: record_id.clone(),
            document: document.clone(),
            meta: meta.clone(),
        });
        Ok(record_id)
    }
}

#[async_trait]
impl PersistenceService for MemoryPersistence {
    async fn create(&self, document: &Blueprint, meta: &SaveMeta) -> Result<RecordId, PersistError> {
        self.store(SaveKind::Create, None, document, meta)
    }

    async fn update(
        &self,
        record_id: &RecordId,
        document: &Blueprint,
        meta: &SaveMeta,
    ) -> Result<RecordId, PersistError> {
        self.store(SaveKind::Update, Some(record_id), document, meta)
    }
}

#[derive(Debug, Default)]
struct AssetState {
    objects: BTreeMap<String, Vec<u8>>,
    deleted: Vec<String>,
    failures: VecDeque<AssetError>,
}

#[derive(Debug)]
pub struct MemoryAssets {
    base_url: String,
    namespace: AssetNamespace,
    state: Mutex<AssetState>,
}

impl MemoryAssets {
    pub fn new(base_url: impl Into<String>, namespace: AssetNamespace) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            namespace,
            state: Mutex::new(AssetState::default()),
        }
    }

    pub fn insert(&self, url: impl Into<String>, bytes: Vec<u8>) {
        lock(&self.state).objects.insert(url.into(), bytes);
    }

    pub fn contains(&self, url: &str) -> bool {
        lock(&self.state).objects.contains_key(url)
    }

    pub fn deleted(&self) -> Vec<String> {
        lock(&self.state).deleted.clone()
    }

    pub fn fail_next_delete(&self, error: AssetError) {
        lock(&self.state).failures.push_back(error);
    }
}

#[async_trait]
impl AssetStorage for MemoryAssets {
    async fn upload(
        &self,
        blueprint_id: &BlueprintId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, AssetError> {
        let file_name = crate::assets::validate_file_name(file_name)?;
        let url = format!("{}/{}", self.base_url, self.namespace.object_path(blueprint_id, file_name));
        lock(&self.state).objects.insert(url.clone(), bytes.to_vec());
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<(), AssetError> {
        let mut state = lock(&self.state);
        state.deleted.push(url.to_owned());
        if let Some(error) = state.failures.pop_front() {
            return Err(error);
        }
        // Deleting something that is already gone is fine.
        state.objects.remove(url);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct GeneratorState {
    calls: usize,
    last_instruction: Option<String>,
    last_context: Option<BusinessContext>,
}

/// Remote generator that returns a fixed result, optionally after a delay.
#[derive(Debug)]
pub struct ScriptedGenerator {
    result: Result<Blueprint, GenerationError>,
    delay: Option<Duration>,
    state: Mutex<GeneratorState>,
}

impl ScriptedGenerator {
    pub fn succeeding(document: Blueprint) -> Self {
        Self { result: Ok(document), delay: None, state: Mutex::default() }
    }

    pub fn failing(error: GenerationError) -> Self {
        Self { result: Err(error), delay: None, state: Mutex::default() }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        lock(&self.state).calls
    }

    pub fn last_instruction(&self) -> Option<String> {
        lock(&self.state).last_instruction.clone()
    }

    pub fn last_context(&self) -> Option<BusinessContext> {
        lock(&self.state).last_context.clone()
    }
}

#[async_trait]
impl RemoteGenerator for ScriptedGenerator {
    async fn refine(
        &self,
        _document: &Blueprint,
        instruction: &str,
        context: &BusinessContext,
    ) -> Result<Blueprint, GenerationError> {
        {
            let mut state = lock(&self.state);
            state.calls += 1;
            state.last_instruction = Some(instruction.to_owned());
            state.last_context = Some(context.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}

/// Preview channel that keeps every message.
#[derive(Debug, Default)]
pub struct RecordingPreview {
    messages: Mutex<Vec<PreviewMessage>>,
}

impl RecordingPreview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<PreviewMessage> {
        lock(&self.messages).clone()
    }
}

impl PreviewChannel for RecordingPreview {
    fn publish(&self, message: PreviewMessage) {
        lock(&self.messages).push(message);
    }
}

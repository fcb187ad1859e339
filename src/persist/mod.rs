// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Debounced persistence of the live document.
//!
//! The pipeline runs as a background task that owns the remote record id. Requests only say
//! *that* a save is wanted; the document itself is read from the session's `watch` channel at
//! the moment the save starts, so a burst of edits always persists the latest one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::history::Snapshot;
use crate::model::{Blueprint, RecordId};
use crate::notice::{Notice, Notifier};
use crate::resolve::BusinessContext;

pub const DEFAULT_SAVE_DEBOUNCE: Duration = Duration::from_millis(1500);

/// Metadata sent alongside every save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMeta {
    pub business_name: String,
    pub niche: String,
    pub locale: String,
    pub saved_at: DateTime<Utc>,
}

impl SaveMeta {
    pub fn new(context: &BusinessContext, saved_at: DateTime<Utc>) -> Self {
        Self {
            business_name: context.name.clone(),
            niche: context.niche.clone(),
            locale: context.locale.clone(),
            saved_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistError {
    #[error("not authorized to save: {message}")]
    Unauthorized { message: String },
    #[error("save failed: {message}")]
    Failed { message: String },
}

impl PersistError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

/// Remote store for blueprints. Last write wins.
#[async_trait]
pub trait PersistenceService: Send + Sync {
    async fn create(&self, document: &Blueprint, meta: &SaveMeta) -> Result<RecordId, PersistError>;

    async fn update(
        &self,
        record_id: &RecordId,
        document: &Blueprint,
        meta: &SaveMeta,
    ) -> Result<RecordId, PersistError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SaveState {
    Idle,
    Saving,
    Saved { at: DateTime<Utc> },
    Error { message: String, unauthorized: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveStatus {
    pub state: SaveState,
    pub record_id: Option<RecordId>,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub saves: u64,
}

impl SaveStatus {
    fn new(record_id: Option<RecordId>) -> Self {
        Self { state: SaveState::Idle, record_id, last_saved_at: None, saves: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Created(RecordId),
    Updated(RecordId),
    /// Debounced save with no remote record yet.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub debounce: Duration,
    /// Whether a debounced save may create the remote record. Explicit flushes always may.
    pub autosave_creates: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { debounce: DEFAULT_SAVE_DEBOUNCE, autosave_creates: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Debounced,
    Explicit,
}

enum Request {
    Schedule,
    Flush(oneshot::Sender<Result<SaveOutcome, PersistError>>),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlushError {
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("persistence pipeline has stopped")]
    Stopped,
}

pub struct PersistencePipeline {
    requests: mpsc::UnboundedSender<Request>,
    status: Arc<watch::Sender<SaveStatus>>,
    generation: Arc<AtomicU64>,
    worker: JoinHandle<()>,
}

impl PersistencePipeline {
    /// Spawns the save worker on the current tokio runtime.
    pub fn spawn(
        service: Arc<dyn PersistenceService>,
        documents: watch::Receiver<Snapshot>,
        record_id: Option<RecordId>,
        context: BusinessContext,
        config: PipelineConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (requests, rx) = mpsc::unbounded_channel();
        let (status_tx, _) = watch::channel(SaveStatus::new(record_id.clone()));
        let status = Arc::new(status_tx);
        let generation = Arc::new(AtomicU64::new(0));

        let worker = Worker {
            service,
            documents,
            record_id,
            context,
            config,
            notifier,
            status: status.clone(),
            generation: generation.clone(),
        };
        let worker = tokio::spawn(worker.run(rx));

        Self { requests, status, generation, worker }
    }

    /// Requests a save of whatever the document is once the debounce window elapses.
    pub fn schedule(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.status.send_if_modified(|status| {
            if status.state == SaveState::Idle {
                return false;
            }
            status.state = SaveState::Idle;
            true
        });
        if self.requests.send(Request::Schedule).is_err() {
            tracing::warn!("save requested after the persistence pipeline stopped");
        }
    }

    /// Saves immediately, bypassing the debounce window. Creates the remote record if needed.
    pub async fn flush(&self) -> Result<SaveOutcome, FlushError> {
        let (reply, rx) = oneshot::channel();
        self.requests.send(Request::Flush(reply)).map_err(|_| FlushError::Stopped)?;
        Ok(rx.await.map_err(|_| FlushError::Stopped)??)
    }

    pub fn status(&self) -> SaveStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.status.subscribe()
    }

    /// Stops accepting requests, performs a pending debounced save and waits for the worker.
    pub async fn shutdown(self) {
        let Self { requests, worker, .. } = self;
        drop(requests);
        if let Err(err) = worker.await {
            tracing::warn!(%err, "persistence worker ended abnormally");
        }
    }
}

struct Worker {
    service: Arc<dyn PersistenceService>,
    documents: watch::Receiver<Snapshot>,
    record_id: Option<RecordId>,
    context: BusinessContext,
    config: PipelineConfig,
    notifier: Arc<dyn Notifier>,
    status: Arc<watch::Sender<SaveStatus>>,
    generation: Arc<AtomicU64>,
}

impl Worker {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Request>) {
        let mut deadline: Option<Instant> = None;
        loop {
            let request = match deadline {
                Some(at) => tokio::select! {
                    request = rx.recv() => request,
                    _ = tokio::time::sleep_until(at) => {
                        deadline = None;
                        let _ = self.save(Trigger::Debounced).await;
                        continue;
                    }
                },
                None => rx.recv().await,
            };

            match request {
                Some(Request::Schedule) => {
                    deadline = Some(Instant::now() + self.config.debounce);
                }
                Some(Request::Flush(reply)) => {
                    deadline = None;
                    let outcome = self.save(Trigger::Explicit).await;
                    let _ = reply.send(outcome);
                }
                None => {
                    if deadline.is_some() {
                        let _ = self.save(Trigger::Debounced).await;
                    }
                    break;
                }
            }
        }
    }

    async fn save(&mut self, trigger: Trigger) -> Result<SaveOutcome, PersistError> {
        if self.record_id.is_none() && trigger == Trigger::Debounced && !self.config.autosave_creates
        {
            tracing::debug!("skipping autosave: no remote record yet");
            return Ok(SaveOutcome::Skipped);
        }

        // Read at flush time, never at schedule time.
        let document = self.documents.borrow().clone();
        let generation = self.generation.load(Ordering::SeqCst);
        self.status.send_modify(|status| status.state = SaveState::Saving);

        let meta = SaveMeta::new(&self.context, Utc::now());
        let result = match &self.record_id {
            Some(record_id) => self
                .service
                .update(record_id, &document, &meta)
                .await
                .map(SaveOutcome::Updated),
            None => self.service.create(&document, &meta).await.map(SaveOutcome::Created),
        };

        match result {
            Ok(outcome) => {
                let (SaveOutcome::Created(record_id) | SaveOutcome::Updated(record_id)) = &outcome
                else {
                    return Ok(outcome);
                };
                if matches!(outcome, SaveOutcome::Created(_)) {
                    tracing::info!(record_id = %record_id, "created remote record");
                }
                self.record_id = Some(record_id.clone());
                let at = meta.saved_at;
                let fresh = self.generation.load(Ordering::SeqCst) == generation;
                self.status.send_modify(|status| {
                    status.record_id = Some(record_id.clone());
                    status.last_saved_at = Some(at);
                    status.saves += 1;
                    // A mutation that arrived mid-save keeps the indicator idle.
                    status.state = if fresh { SaveState::Saved { at } } else { SaveState::Idle };
                });
                tracing::info!(record_id = %record_id, blueprint_id = %document.id(), "saved blueprint");
                self.notifier.notify(Notice::Saved { at });
                Ok(outcome)
            }
            Err(err) => {
                tracing::warn!(%err, blueprint_id = %document.id(), "save failed");
                let unauthorized = err.is_unauthorized();
                self.status.send_modify(|status| {
                    status.state = SaveState::Error { message: err.to_string(), unauthorized };
                });
                self.notifier.notify(if unauthorized {
                    Notice::SignInRequired
                } else {
                    Notice::SaveFailed { message: err.to_string() }
                });
                Err(err)
            }
        }
    }
}

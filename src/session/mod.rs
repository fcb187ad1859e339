// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! One editing session.
//!
//! `EditorSession` owns the history store and is the only writer of the document. Every
//! transition is published on a `watch` channel; the persistence pipeline reads that channel
//! when a save starts, and read-only surfaces can subscribe to it without taking the session.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;

use crate::assets::{AssetError, AssetLifecycle, AssetStorage};
use crate::config::EditorConfig;
use crate::history::{HistoryStore, Snapshot};
use crate::model::{AssetNamespace, Blueprint, BlueprintError, ContentValue, RecordId, SectionId};
use crate::notice::{Notice, Notifier};
use crate::ops::{apply_ops, ApplyError, Delta, Op, SectionOp};
use crate::persist::{
    FlushError, PersistenceService, PersistencePipeline, PipelineConfig, SaveOutcome, SaveStatus,
};
use crate::preview::{PreviewChannel, PreviewMessage};
use crate::resolve::{
    AppliedInstruction, BusinessContext, ChainFailure, Instruction, RemoteGenerator,
    ResolutionChain, TierKind,
};

/// External collaborators of a session.
#[derive(Clone)]
pub struct EditorServices {
    pub persistence: Arc<dyn PersistenceService>,
    pub generator: Arc<dyn RemoteGenerator>,
    pub assets: Arc<dyn AssetStorage>,
    pub preview: Arc<dyn PreviewChannel>,
    pub notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for EditorServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorServices").finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct HandleState {
    active: AtomicBool,
    generating: AtomicBool,
}

/// Cloneable view of a session's lifecycle flags.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    state: Arc<HandleState>,
}

impl SessionHandle {
    fn new() -> Self {
        let state = HandleState { active: AtomicBool::new(true), generating: AtomicBool::new(false) };
        Self { state: Arc::new(state) }
    }

    pub fn is_active(&self) -> bool {
        self.state.active.load(Ordering::SeqCst)
    }

    /// True while an instruction is being resolved.
    pub fn is_generating(&self) -> bool {
        self.state.generating.load(Ordering::SeqCst)
    }

    /// Marks the session closed. An instruction still in flight is discarded when it resolves.
    pub fn close(&self) {
        self.state.active.store(false, Ordering::SeqCst);
    }

    fn begin_generation(&self) -> Option<GenerationGuard> {
        self.state
            .generating
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| GenerationGuard { state: self.state.clone() })
    }
}

struct GenerationGuard {
    state: Arc<HandleState>,
}

impl Drop for GenerationGuard {
    fn drop(&mut self) {
        self.state.generating.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("editing session is closed")]
    Closed,
    #[error("another instruction is still being generated")]
    Busy,
    #[error("instruction is empty")]
    EmptyInstruction,
    #[error(transparent)]
    Apply(#[from] ApplyError),
    #[error(transparent)]
    Resolution(#[from] ChainFailure),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Save(#[from] FlushError),
    #[error(transparent)]
    Invalid(#[from] BlueprintError),
}

/// Result of a committed instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionOutcome {
    pub tier: TierKind,
    pub message: String,
    pub delta: Delta,
    pub revision: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStatus {
    pub revision: u64,
    pub can_undo: bool,
    pub can_redo: bool,
    pub past: usize,
    pub future: usize,
    pub limit: usize,
    pub generating: bool,
    pub save: SaveStatus,
}

pub struct EditorSession {
    history: HistoryStore,
    live: watch::Sender<Snapshot>,
    chain: ResolutionChain,
    context: BusinessContext,
    pipeline: PersistencePipeline,
    assets: AssetLifecycle,
    preview: Arc<dyn PreviewChannel>,
    notifier: Arc<dyn Notifier>,
    handle: SessionHandle,
}

impl EditorSession {
    /// Loads `document` without an undo entry and starts the persistence pipeline.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(
        document: Blueprint,
        record_id: Option<RecordId>,
        context: BusinessContext,
        services: EditorServices,
        config: &EditorConfig,
    ) -> Result<Self, SessionError> {
        document.validate()?;
        let history = HistoryStore::new(document, config.history_limit);
        let (live, documents) = watch::channel(history.current().clone());

        let pipeline = PersistencePipeline::spawn(
            services.persistence,
            documents,
            record_id,
            context.clone(),
            PipelineConfig { debounce: config.save_debounce, autosave_creates: config.autosave_creates },
            services.notifier.clone(),
        );
        let assets =
            AssetLifecycle::new(services.assets, AssetNamespace::new(config.asset_namespace.as_str()));
        let chain = ResolutionChain::standard(config.refinement_memory, services.generator);

        tracing::info!(
            blueprint_id = %history.current().id(),
            business = %context.name,
            "opened editing session"
        );

        Ok(Self {
            history,
            live,
            chain,
            context,
            pipeline,
            assets,
            preview: services.preview,
            notifier: services.notifier,
            handle: SessionHandle::new(),
        })
    }

    /// Replaces the resolution chain, keeping everything else.
    pub fn with_chain(mut self, chain: ResolutionChain) -> Self {
        self.chain = chain;
        self
    }

    pub fn current(&self) -> &Snapshot {
        self.history.current()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn context(&self) -> &BusinessContext {
        &self.context
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    pub fn save_status(&self) -> SaveStatus {
        self.pipeline.status()
    }

    pub fn subscribe_document(&self) -> watch::Receiver<Snapshot> {
        self.live.subscribe()
    }

    pub fn subscribe_save_status(&self) -> watch::Receiver<SaveStatus> {
        self.pipeline.subscribe()
    }

    pub fn status(&self) -> HistoryStatus {
        HistoryStatus {
            revision: self.history.revision(),
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
            past: self.history.past_len(),
            future: self.history.future_len(),
            limit: self.history.limit(),
            generating: self.handle.is_generating(),
            save: self.pipeline.status(),
        }
    }

    /// Resolves a free-text instruction and commits the result.
    ///
    /// On failure the document is left untouched and a "refinement failed" notice is sent.
    pub async fn submit(&mut self, text: &str) -> Result<InstructionOutcome, SessionError> {
        self.ensure_active()?;
        let instruction = Instruction::new(text);
        if instruction.is_empty() {
            return Err(SessionError::EmptyInstruction);
        }
        let _generating = self.handle.begin_generation().ok_or(SessionError::Busy)?;

        self.preview.publish(PreviewMessage::Command { instruction: instruction.text().to_owned() });
        let before = self.history.current().clone();
        let result = self.chain.resolve(&before, &instruction, &self.context).await;

        if !self.handle.is_active() {
            tracing::info!(instruction = %instruction, "session closed while resolving; discarding result");
            return Err(SessionError::Closed);
        }

        let resolution = match result {
            Ok(resolution) => resolution,
            Err(failure) => {
                tracing::warn!(instruction = %instruction, error = %failure, "instruction failed");
                self.notifier.notify(Notice::RefinementFailed { message: failure.user_message() });
                return Err(failure.into());
            }
        };

        let after = self.commit_change(resolution.document);
        tracing::info!(
            instruction = %instruction,
            tier = %resolution.tier,
            revision = self.history.revision(),
            "applied instruction"
        );

        self.chain.observe(&AppliedInstruction {
            instruction,
            tier: resolution.tier,
            before,
            after,
            ops: resolution.ops,
            delta: resolution.delta.clone(),
        });
        self.notifier.notify(Notice::Applied {
            tier: resolution.tier,
            message: resolution.message.clone(),
        });

        Ok(InstructionOutcome {
            tier: resolution.tier,
            message: resolution.message,
            delta: resolution.delta,
            revision: self.history.revision(),
        })
    }

    /// Applies direct edits. An empty delta means nothing changed and nothing was committed.
    pub fn apply_edit(&mut self, ops: &[Op]) -> Result<Delta, SessionError> {
        self.ensure_active()?;
        let result = apply_ops(self.history.current(), ops)?;
        if result.delta.is_empty() {
            return Ok(result.delta);
        }
        self.commit_change(result.document);
        tracing::debug!(ops = result.applied, revision = self.history.revision(), "applied edit");
        Ok(result.delta)
    }

    /// Drag-reorder within the section's page.
    pub fn move_section(&mut self, section_id: &SectionId, to_index: usize) -> Result<Delta, SessionError> {
        self.apply_edit(&[Op::Section(SectionOp::Move { section_id: section_id.clone(), to_index })])
    }

    /// Uploads a file and stores its URL in `key` of the section. Returns the URL.
    pub async fn upload_asset(
        &mut self,
        section_id: &SectionId,
        key: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, SessionError> {
        self.ensure_active()?;
        if self.history.current().find_section(section_id).is_none() {
            return Err(ApplyError::SectionNotFound { section_id: section_id.clone() }.into());
        }

        let blueprint_id = self.history.current().id().clone();
        let storage = self.assets.storage().clone();
        let url = storage.upload(&blueprint_id, file_name, bytes).await?;
        tracing::info!(%url, section_id = %section_id, "uploaded asset");

        self.apply_edit(&[Op::Section(SectionOp::SetField {
            section_id: section_id.clone(),
            key: key.to_owned(),
            value: ContentValue::from(url.as_str()),
        })])?;
        Ok(url)
    }

    /// Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> Result<bool, SessionError> {
        self.ensure_active()?;
        let Some(snapshot) = self.history.undo().cloned() else {
            return Ok(false);
        };
        self.after_transition(snapshot);
        Ok(true)
    }

    /// Returns `false` when there is nothing to redo.
    pub fn redo(&mut self) -> Result<bool, SessionError> {
        self.ensure_active()?;
        let Some(snapshot) = self.history.redo().cloned() else {
            return Ok(false);
        };
        self.after_transition(snapshot);
        Ok(true)
    }

    /// Replaces the document with the server's copy. No undo entry, no save.
    pub fn resync(&mut self, document: Blueprint) -> Result<(), SessionError> {
        self.ensure_active()?;
        document.validate()?;
        let snapshot = self.history.commit_silent(document).clone();
        self.publish(&snapshot);
        self.chain.reset();
        tracing::info!(revision = self.history.revision(), "resynchronized document");
        Ok(())
    }

    /// Saves now, creating the remote record if there is none yet.
    pub async fn save_now(&mut self) -> Result<SaveOutcome, SessionError> {
        self.ensure_active()?;
        Ok(self.pipeline.flush().await?)
    }

    /// Closes the session, saving a pending change and waiting for asset cleanup.
    ///
    /// Undo and redo end with the session, so assets only they referenced are deleted here.
    pub async fn close(self) {
        let Self { handle, pipeline, mut assets, history, .. } = self;
        handle.close();
        pipeline.shutdown().await;
        let before = assets.owned_urls(history.snapshots().map(|snapshot| &**snapshot));
        let after = assets.owned_urls([&**history.current()]);
        let orphaned = assets.reconcile(history.current().id(), &before, &after);
        if orphaned > 0 {
            tracing::debug!(orphaned, "scheduled asset cleanup for dropped history");
        }
        assets.settle().await;
        tracing::info!(blueprint_id = %history.current().id(), "closed editing session");
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        if self.handle.is_active() {
            Ok(())
        } else {
            Err(SessionError::Closed)
        }
    }

    fn commit_change(&mut self, mut document: Blueprint) -> Snapshot {
        document.touch(Utc::now());
        let before = self.history_assets();
        let after = self.history.commit(document).clone();
        self.publish(&after);
        let retained = self.history_assets();
        let orphaned = self.assets.reconcile(after.id(), &before, &retained);
        if orphaned > 0 {
            tracing::debug!(orphaned, "scheduled asset cleanup");
        }
        self.pipeline.schedule();
        after
    }

    /// Owned assets that the current document, undo or redo can still show.
    fn history_assets(&self) -> BTreeSet<String> {
        self.assets.owned_urls(self.history.snapshots().map(|snapshot| &**snapshot))
    }

    fn after_transition(&mut self, snapshot: Snapshot) {
        self.publish(&snapshot);
        self.chain.reset();
        self.pipeline.schedule();
    }

    fn publish(&self, snapshot: &Snapshot) {
        self.live.send_replace(snapshot.clone());
        self.preview.publish(PreviewMessage::BlueprintUpdate { document: snapshot.to_blueprint() });
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("blueprint_id", self.history.current().id())
            .field("revision", &self.history.revision())
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

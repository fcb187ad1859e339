// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use base64::Engine as _;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::{Json, Parameters};
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData, ServerHandler, ServiceExt};
use tokio::sync::{watch, Mutex, MutexGuard};

use crate::assets::AssetError;
use crate::history::Snapshot;
use crate::model::{ColorSlot, ContentValue, PageSlug, SectionId, ThemeMode};
use crate::ops::{normalize_color, ApplyError, Delta, Op, SectionOp, ThemeOp};
use crate::persist::{FlushError, SaveOutcome, SaveState};
use crate::session::{EditorSession, SessionError, SessionHandle};

use super::types::*;

const DEFAULT_ASSET_FIELD: &str = "image";

/// MCP tool surface over one editing session.
///
/// Reads go through the session's live document channel and never wait for an instruction
/// that is still generating.
#[derive(Clone)]
pub struct BlueprintMcp {
    session: Arc<Mutex<Option<EditorSession>>>,
    handle: SessionHandle,
    document: watch::Receiver<Snapshot>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl BlueprintMcp {
    pub fn new(session: EditorSession) -> Self {
        Self {
            handle: session.handle(),
            document: session.subscribe_document(),
            session: Arc::new(Mutex::new(Some(session))),
            tool_router: Self::tool_router(),
        }
    }

    /// Serves MCP over stdio until the client disconnects, then closes the session.
    pub async fn serve_stdio(self) -> Result<(), rmcp::RmcpError> {
        let server = self.clone();
        let result = async {
            let service = self.serve((tokio::io::stdin(), tokio::io::stdout())).await?;
            service.waiting().await?;
            Ok::<(), rmcp::RmcpError>(())
        }
        .await;
        server.close().await;
        result
    }

    /// Closes the session once. Later tool calls report a closed session.
    pub async fn close(&self) {
        self.handle.close();
        let session = self.session.lock().await.take();
        if let Some(session) = session {
            session.close().await;
        }
    }

    async fn lock_session(&self) -> Result<MutexGuard<'_, Option<EditorSession>>, ErrorData> {
        let guard = self.session.lock().await;
        if guard.is_none() {
            return Err(map_session_error(SessionError::Closed));
        }
        Ok(guard)
    }

    async fn edit(&self, ops: Vec<Op>) -> Result<Json<EditResponse>, ErrorData> {
        let mut guard = self.lock_session().await?;
        let session = active(&mut guard)?;
        let delta = session.apply_edit(&ops).map_err(map_session_error)?;
        Ok(Json(EditResponse {
            changed: !delta.is_empty(),
            revision: session.history().revision(),
            delta: delta_summary(&delta),
        }))
    }

    /// Read the current blueprint (optionally a single page) as JSON.
    #[tool(name = "blueprint.read")]
    async fn blueprint_read(
        &self,
        params: Parameters<BlueprintReadParams>,
    ) -> Result<Json<BlueprintReadResponse>, ErrorData> {
        let snapshot = self.document.borrow().clone();
        let document = match params.0.page.as_deref() {
            None => serde_json::to_value(&*snapshot),
            Some(raw) => {
                let slug = parse_id::<PageSlug>("page", raw)?;
                let page = snapshot.page(&slug).ok_or_else(|| {
                    ErrorData::resource_not_found(
                        "page not found",
                        Some(serde_json::json!({ "page": raw })),
                    )
                })?;
                serde_json::to_value(page)
            }
        }
        .map_err(|err| ErrorData::internal_error(format!("cannot encode blueprint: {err}"), None))?;

        Ok(Json(BlueprintReadResponse {
            blueprint_id: snapshot.id().to_string(),
            name: snapshot.name().to_owned(),
            updated_at: snapshot.updated_at().to_rfc3339(),
            generating: self.handle.is_generating(),
            document,
        }))
    }

    /// Apply a free-text instruction ("make it blue", "move the contact section to the top").
    /// Refused while a previous instruction is still generating.
    #[tool(name = "blueprint.instruct")]
    async fn blueprint_instruct(
        &self,
        params: Parameters<InstructParams>,
    ) -> Result<Json<InstructResponse>, ErrorData> {
        if self.handle.is_generating() {
            return Err(map_session_error(SessionError::Busy));
        }
        let mut guard = self.lock_session().await?;
        let session = active(&mut guard)?;
        let outcome = session.submit(&params.0.instruction).await.map_err(map_session_error)?;
        Ok(Json(InstructResponse {
            tier: outcome.tier.to_string(),
            message: outcome.message,
            revision: outcome.revision,
            delta: delta_summary(&outcome.delta),
        }))
    }

    /// Set one content field of a section. A null value removes the field.
    #[tool(name = "blueprint.set_field")]
    async fn blueprint_set_field(
        &self,
        params: Parameters<SetFieldParams>,
    ) -> Result<Json<EditResponse>, ErrorData> {
        let SetFieldParams { section_id, key, value } = params.0;
        let section_id = parse_id::<SectionId>("section_id", &section_id)?;
        if key.trim().is_empty() {
            return Err(ErrorData::invalid_params("key must not be empty", None));
        }
        let op = if value.is_null() {
            SectionOp::RemoveField { section_id, key }
        } else {
            let value = ContentValue::from_json(value.clone()).ok_or_else(|| {
                ErrorData::invalid_params(
                    "value must be a string, number, boolean or null",
                    Some(serde_json::json!({ "value": value })),
                )
            })?;
            SectionOp::SetField { section_id, key, value }
        };
        self.edit(vec![Op::Section(op)]).await
    }

    /// Move a section to a position within its page.
    #[tool(name = "blueprint.move_section")]
    async fn blueprint_move_section(
        &self,
        params: Parameters<MoveSectionParams>,
    ) -> Result<Json<EditResponse>, ErrorData> {
        let section_id = parse_id::<SectionId>("section_id", &params.0.section_id)?;
        let to_index = usize::try_from(params.0.to_index).map_err(|_| {
            ErrorData::invalid_params(
                "to_index is too large",
                Some(serde_json::json!({ "to_index": params.0.to_index })),
            )
        })?;

        let mut guard = self.lock_session().await?;
        let session = active(&mut guard)?;
        let delta = session.move_section(&section_id, to_index).map_err(map_session_error)?;
        Ok(Json(EditResponse {
            changed: !delta.is_empty(),
            revision: session.history().revision(),
            delta: delta_summary(&delta),
        }))
    }

    /// Remove a section. Owned images it referenced are garbage-collected.
    #[tool(name = "blueprint.remove_section")]
    async fn blueprint_remove_section(
        &self,
        params: Parameters<RemoveSectionParams>,
    ) -> Result<Json<EditResponse>, ErrorData> {
        let section_id = parse_id::<SectionId>("section_id", &params.0.section_id)?;
        self.edit(vec![Op::Section(SectionOp::Remove { section_id })]).await
    }

    /// Change theme colors (#rgb or #rrggbb), font or visual mode.
    #[tool(name = "blueprint.set_theme")]
    async fn blueprint_set_theme(
        &self,
        params: Parameters<SetThemeParams>,
    ) -> Result<Json<EditResponse>, ErrorData> {
        let SetThemeParams { primary, secondary, accent, font, mode } = params.0;

        let mut ops = Vec::new();
        for (slot, value) in [
            (ColorSlot::Primary, primary),
            (ColorSlot::Secondary, secondary),
            (ColorSlot::Accent, accent),
        ] {
            let Some(value) = value else { continue };
            let value = normalize_color(&value).map_err(map_apply_error)?;
            ops.push(Op::Theme(ThemeOp::SetColor { slot, value }));
        }
        if let Some(font) = font {
            let font = font.trim();
            if font.is_empty() {
                return Err(ErrorData::invalid_params("font must not be empty", None));
            }
            ops.push(Op::Theme(ThemeOp::SetFont { font: font.to_owned() }));
        }
        if let Some(raw) = mode {
            let mode = ThemeMode::from_word(&raw).ok_or_else(|| {
                ErrorData::invalid_params(
                    "unknown theme mode",
                    Some(serde_json::json!({
                        "mode": raw,
                        "expected": ["light", "dark", "vibrant", "minimal", "elegant", "playful"],
                    })),
                )
            })?;
            ops.push(Op::Theme(ThemeOp::SetMode { mode }));
        }
        if ops.is_empty() {
            return Err(ErrorData::invalid_params("nothing to change", None));
        }
        self.edit(ops).await
    }

    /// Upload a base64-encoded file and store its URL in a section field.
    #[tool(name = "asset.upload")]
    async fn asset_upload(
        &self,
        params: Parameters<AssetUploadParams>,
    ) -> Result<Json<AssetUploadResponse>, ErrorData> {
        let AssetUploadParams { section_id, key, file_name, data_base64 } = params.0;
        let section_id = parse_id::<SectionId>("section_id", &section_id)?;
        let key = key.unwrap_or_else(|| DEFAULT_ASSET_FIELD.to_owned());
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(data_base64.trim())
            .map_err(|err| {
                ErrorData::invalid_params(
                    "data_base64 is not valid base64",
                    Some(serde_json::json!({ "error": err.to_string() })),
                )
            })?;

        let mut guard = self.lock_session().await?;
        let session = active(&mut guard)?;
        let url = session
            .upload_asset(&section_id, &key, &file_name, &bytes)
            .await
            .map_err(map_session_error)?;
        Ok(Json(AssetUploadResponse {
            url,
            bytes: bytes.len() as u64,
            revision: session.history().revision(),
        }))
    }

    /// Step back one snapshot.
    #[tool(name = "history.undo")]
    async fn history_undo(&self) -> Result<Json<HistoryStepResponse>, ErrorData> {
        let mut guard = self.lock_session().await?;
        let session = active(&mut guard)?;
        let changed = session.undo().map_err(map_session_error)?;
        Ok(Json(history_step(session, changed)))
    }

    /// Re-apply the last undone snapshot.
    #[tool(name = "history.redo")]
    async fn history_redo(&self) -> Result<Json<HistoryStepResponse>, ErrorData> {
        let mut guard = self.lock_session().await?;
        let session = active(&mut guard)?;
        let changed = session.redo().map_err(map_session_error)?;
        Ok(Json(history_step(session, changed)))
    }

    #[tool(name = "history.status")]
    async fn history_status(&self) -> Result<Json<HistoryStatusResponse>, ErrorData> {
        let mut guard = self.lock_session().await?;
        let status = active(&mut guard)?.status();
        let (save_state, save_error) = match &status.save.state {
            SaveState::Idle => ("idle", None),
            SaveState::Saving => ("saving", None),
            SaveState::Saved { .. } => ("saved", None),
            SaveState::Error { message, .. } => ("error", Some(message.clone())),
        };
        Ok(Json(HistoryStatusResponse {
            revision: status.revision,
            can_undo: status.can_undo,
            can_redo: status.can_redo,
            past: status.past as u64,
            future: status.future as u64,
            limit: status.limit as u64,
            generating: status.generating,
            save_state: save_state.to_owned(),
            save_error,
            record_id: status.save.record_id.as_ref().map(ToString::to_string),
            last_saved_at: status.save.last_saved_at.map(|at| at.to_rfc3339()),
            saves: status.save.saves,
        }))
    }

    /// Save now, creating the stored record if this blueprint has none yet.
    #[tool(name = "blueprint.save")]
    async fn blueprint_save(&self) -> Result<Json<SaveResponse>, ErrorData> {
        let mut guard = self.lock_session().await?;
        let session = active(&mut guard)?;
        let outcome = session.save_now().await.map_err(map_session_error)?;
        let (outcome, record_id) = match outcome {
            SaveOutcome::Created(id) => ("created", Some(id.to_string())),
            SaveOutcome::Updated(id) => ("updated", Some(id.to_string())),
            SaveOutcome::Skipped => ("skipped", None),
        };
        Ok(Json(SaveResponse { outcome: outcome.to_owned(), record_id }))
    }
}

#[tool_handler]
impl ServerHandler for BlueprintMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Blueprint Studio website editor (tools: blueprint.read, blueprint.instruct, blueprint.set_field, blueprint.move_section, blueprint.remove_section, blueprint.set_theme, asset.upload, history.undo, history.redo, history.status, blueprint.save)"
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// Extracted mapping/parsing helpers for MCP tool handlers.
include!("server/helpers.rs");

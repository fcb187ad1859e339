// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DeltaSummary {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub updated: Vec<String>,
    pub theme: bool,
    pub document: bool,
    pub pages: bool,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct BlueprintReadParams {
    /// Only return this page.
    #[serde(default)]
    pub page: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BlueprintReadResponse {
    pub blueprint_id: String,
    pub name: String,
    pub updated_at: String,
    pub generating: bool,
    /// The whole document, or a single page when `page` was given.
    pub document: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct InstructParams {
    /// Free-text edit request, e.g. "make it blue" or "change the headline to 'Hello'".
    pub instruction: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InstructResponse {
    pub tier: String,
    pub message: String,
    pub revision: u64,
    pub delta: DeltaSummary,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SetFieldParams {
    pub section_id: String,
    pub key: String,
    /// String, number, boolean, or null to remove the field.
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct MoveSectionParams {
    pub section_id: String,
    /// Zero-based target position in the section's page.
    pub to_index: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RemoveSectionParams {
    pub section_id: String,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct SetThemeParams {
    #[serde(default)]
    pub primary: Option<String>,
    #[serde(default)]
    pub secondary: Option<String>,
    #[serde(default)]
    pub accent: Option<String>,
    #[serde(default)]
    pub font: Option<String>,
    /// light, dark, vibrant, minimal, elegant or playful.
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EditResponse {
    pub changed: bool,
    pub revision: u64,
    pub delta: DeltaSummary,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AssetUploadParams {
    pub section_id: String,
    /// Content field that receives the URL. Defaults to `image`.
    #[serde(default)]
    pub key: Option<String>,
    pub file_name: String,
    pub data_base64: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AssetUploadResponse {
    pub url: String,
    pub bytes: u64,
    pub revision: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HistoryStepResponse {
    pub changed: bool,
    pub revision: u64,
    pub can_undo: bool,
    pub can_redo: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HistoryStatusResponse {
    pub revision: u64,
    pub can_undo: bool,
    pub can_redo: bool,
    pub past: u64,
    pub future: u64,
    pub limit: u64,
    pub generating: bool,
    /// idle, saving, saved or error.
    pub save_state: String,
    pub save_error: Option<String>,
    pub record_id: Option<String>,
    pub last_saved_at: Option<String>,
    pub saves: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SaveResponse {
    /// created, updated or skipped.
    pub outcome: String,
    pub record_id: Option<String>,
}

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

fn active<'a>(
    guard: &'a mut MutexGuard<'_, Option<EditorSession>>,
) -> Result<&'a mut EditorSession, ErrorData> {
    guard.as_mut().ok_or_else(|| map_session_error(SessionError::Closed))
}

fn parse_id<I>(field: &'static str, raw: &str) -> Result<I, ErrorData>
where
    I: std::str::FromStr<Err = crate::model::IdError>,
{
    raw.trim().parse::<I>().map_err(|err| {
        ErrorData::invalid_params(
            format!("invalid {field}: {err}"),
            Some(serde_json::json!({ "field": field, "value": raw })),
        )
    })
}

fn delta_summary(delta: &Delta) -> DeltaSummary {
    DeltaSummary {
        added: delta.added.iter().map(ToString::to_string).collect(),
        removed: delta.removed.iter().map(ToString::to_string).collect(),
        updated: delta.updated.iter().map(ToString::to_string).collect(),
        theme: delta.theme,
        document: delta.document,
        pages: delta.pages,
    }
}

fn history_step(session: &EditorSession, changed: bool) -> HistoryStepResponse {
    let history = session.history();
    HistoryStepResponse {
        changed,
        revision: history.revision(),
        can_undo: history.can_undo(),
        can_redo: history.can_redo(),
    }
}

fn map_apply_error(err: ApplyError) -> ErrorData {
    match err {
        ApplyError::SectionNotFound { section_id } => ErrorData::resource_not_found(
            "section not found",
            Some(serde_json::json!({ "section_id": section_id.as_str() })),
        ),
        ApplyError::PageNotFound { slug } => ErrorData::resource_not_found(
            "page not found",
            Some(serde_json::json!({ "page": slug.as_str() })),
        ),
        ApplyError::DuplicateSectionId { section_id } => ErrorData::invalid_params(
            "section already exists",
            Some(serde_json::json!({ "section_id": section_id.as_str() })),
        ),
        ApplyError::IndexOutOfRange { index, len } => ErrorData::invalid_params(
            "index out of range",
            Some(serde_json::json!({ "index": index as u64, "len": len as u64 })),
        ),
        ApplyError::InvalidColor { value } => ErrorData::invalid_params(
            "invalid color (expected #rgb or #rrggbb)",
            Some(serde_json::json!({ "value": value })),
        ),
        ApplyError::EmptySearchText => {
            ErrorData::invalid_params("text to replace must not be empty", None)
        }
    }
}

fn map_session_error(err: SessionError) -> ErrorData {
    match err {
        SessionError::Closed => ErrorData::invalid_request("editing session is closed", None),
        SessionError::Busy => ErrorData::invalid_request(
            "generation in progress",
            Some(serde_json::json!({ "retry": "wait until history.status reports generating=false" })),
        ),
        SessionError::EmptyInstruction => {
            ErrorData::invalid_params("instruction must not be empty", None)
        }
        SessionError::Apply(err) => map_apply_error(err),
        SessionError::Resolution(failure) => {
            let attempts = failure
                .attempts
                .iter()
                .map(|attempt| {
                    serde_json::json!({ "tier": attempt.tier.as_str(), "reason": attempt.decline.to_string() })
                })
                .collect::<Vec<_>>();
            ErrorData::invalid_request(
                failure.user_message(),
                Some(serde_json::json!({ "attempts": attempts, "document_changed": false })),
            )
        }
        SessionError::Asset(AssetError::InvalidFileName { name }) => ErrorData::invalid_params(
            "invalid file name",
            Some(serde_json::json!({ "file_name": name })),
        ),
        SessionError::Asset(err) => ErrorData::internal_error(format!("asset upload failed: {err}"), None),
        SessionError::Save(FlushError::Persist(err)) if err.is_unauthorized() => {
            ErrorData::invalid_request(
                "sign in required",
                Some(serde_json::json!({ "error": err.to_string() })),
            )
        }
        SessionError::Save(err) => ErrorData::internal_error(format!("save failed: {err}"), None),
        SessionError::Invalid(err) => ErrorData::invalid_params(err.to_string(), None),
    }
}

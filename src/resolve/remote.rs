// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Remote generation fallback.

use std::sync::Arc;

use async_trait::async_trait;

use super::{BusinessContext, Decline, Instruction, RemoteError, Resolution, Tier, TierKind};
use crate::model::Blueprint;
use crate::ops::diff;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("network error: {message}")]
    Network { message: String },
    #[error("quota exhausted: {message}")]
    Quota { message: String },
    #[error("not authorized to use the generation service")]
    Unauthorized,
    #[error("malformed response: {message}")]
    Malformed { message: String },
}

impl From<GenerationError> for RemoteError {
    fn from(value: GenerationError) -> Self {
        match value {
            GenerationError::Network { message } => RemoteError::Unavailable { message },
            other => RemoteError::Rejected { message: other.to_string() },
        }
    }
}

/// Opaque generative backend: takes a document and an instruction, returns a new document.
#[async_trait]
pub trait RemoteGenerator: Send + Sync {
    async fn refine(
        &self,
        document: &Blueprint,
        instruction: &str,
        context: &BusinessContext,
    ) -> Result<Blueprint, GenerationError>;
}

/// Generator used when no backend is configured. Always unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredGenerator;

#[async_trait]
impl RemoteGenerator for UnconfiguredGenerator {
    async fn refine(
        &self,
        _document: &Blueprint,
        _instruction: &str,
        _context: &BusinessContext,
    ) -> Result<Blueprint, GenerationError> {
        Err(GenerationError::Network { message: "no generation service is configured".to_owned() })
    }
}

pub struct RemoteTier {
    generator: Arc<dyn RemoteGenerator>,
}

impl RemoteTier {
    pub fn new(generator: Arc<dyn RemoteGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Tier for RemoteTier {
    fn kind(&self) -> TierKind {
        TierKind::Remote
    }

    async fn resolve(
        &mut self,
        document: &Blueprint,
        instruction: &Instruction,
        context: &BusinessContext,
    ) -> Result<Resolution, Decline> {
        let mut generated = self
            .generator
            .refine(document, instruction.text(), context)
            .await
            .map_err(|err| {
                tracing::warn!(%err, "remote generation failed");
                Decline::Remote(err.into())
            })?;

        // The record identity is owned by the editor, not the generator.
        generated.set_id(document.id().clone());
        generated.validate().map_err(|err| {
            Decline::Remote(RemoteError::Rejected { message: format!("malformed document: {err}") })
        })?;

        let delta = diff(document, &generated);
        Ok(Resolution {
            document: generated,
            tier: TierKind::Remote,
            message: "Updated the site".to_owned(),
            ops: Vec::new(),
            delta,
        })
    }
}

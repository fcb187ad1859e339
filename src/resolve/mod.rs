// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Tiered command resolution.
//!
//! An instruction is handed to an ordered list of tiers. The first tier that produces a changed
//! document wins; a tier that declines (or produces an identical document) passes the
//! instruction on. Declines are ordinary values, never panics, so tiers can be added or
//! reordered without touching the orchestration.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::history::Snapshot;
use crate::model::Blueprint;
use crate::ops::{Delta, Op};

pub mod patcher;
pub mod refinement;
pub mod remote;

pub use patcher::{CommandPatcher, PatchOutcome};
pub use refinement::{RefinementEngine, DEFAULT_REFINEMENT_MEMORY};
pub use remote::{GenerationError, RemoteGenerator, RemoteTier, UnconfiguredGenerator};

/// Free-text edit request as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    text: String,
    command: String,
    normalized: String,
    // Punctuation cut from the end of `command`, without whitespace.
    trailing: String,
}

impl Instruction {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into().trim().to_owned();
        let (command, trailing) = strip_politeness(&text);
        let normalized = command.to_lowercase();
        Self { text, command, normalized, trailing }
    }

    /// The instruction as submitted, trimmed.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Single-spaced, without a leading "please" or trailing punctuation. Case is preserved.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Lowercase form of [`Instruction::command`].
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// A value captured at the end of [`Instruction::command`], as the user wrote it.
    ///
    /// Quoted values lose their quotes and any punctuation after them. Unquoted values get
    /// back the `!` or `?` that normalization cut off; a closing `.` or `,` ends the sentence.
    pub fn trailing_value(&self, captured: &str) -> String {
        let unquoted = patcher::unquote(captured);
        if unquoted.len() != captured.trim().len() {
            return unquoted.to_owned();
        }
        format!("{unquoted}{}", self.trailing.trim_end_matches(['.', ',']))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn strip_politeness(text: &str) -> (String, String) {
    let mut words = text.split_whitespace().collect::<Vec<_>>();
    if words.first().is_some_and(|word| word.trim_end_matches(',').eq_ignore_ascii_case("please")) {
        words.remove(0);
    }
    let joined = words.join(" ");
    let command = joined
        .trim_end_matches(|c: char| matches!(c, '.' | '!' | '?' | ',') || c.is_whitespace());
    let trailing = joined[command.len()..].chars().filter(|c| !c.is_whitespace()).collect();
    (command.to_owned(), trailing)
}

/// Business context forwarded to the remote generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessContext {
    pub name: String,
    #[serde(default)]
    pub niche: String,
    #[serde(default)]
    pub locale: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierKind {
    Patcher,
    Refinement,
    Remote,
}

impl TierKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Patcher => "patcher",
            Self::Refinement => "refinement",
            Self::Remote => "remote",
        }
    }
}

impl fmt::Display for TierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A new document produced by one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub document: Blueprint,
    pub tier: TierKind,
    pub message: String,
    /// Ops that turn the input into `document`. Empty when the tier replaced the whole document.
    pub ops: Vec<Op>,
    pub delta: Delta,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("generation service unavailable: {message}")]
    Unavailable { message: String },
    #[error("generation rejected: {message}")]
    Rejected { message: String },
}

/// Why a tier did not produce a document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Decline {
    #[error("instruction does not match a local patch")]
    PatchNotApplicable,
    #[error("cannot resolve locally: {reason}")]
    RefinementAmbiguous { reason: String },
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Record of an instruction that was committed, fed back to tiers that keep memory.
#[derive(Debug, Clone)]
pub struct AppliedInstruction {
    pub instruction: Instruction,
    pub tier: TierKind,
    pub before: Snapshot,
    pub after: Snapshot,
    pub ops: Vec<Op>,
    pub delta: Delta,
}

#[async_trait]
pub trait Tier: Send {
    fn kind(&self) -> TierKind;

    async fn resolve(
        &mut self,
        document: &Blueprint,
        instruction: &Instruction,
        context: &BusinessContext,
    ) -> Result<Resolution, Decline>;

    /// Called after an instruction resolved by any tier was committed.
    fn observe(&mut self, _applied: &AppliedInstruction) {}

    /// Called when the document changed outside of instruction handling (undo, redo, resync).
    fn reset(&mut self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub tier: TierKind,
    pub decline: Decline,
}

/// Every tier declined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainFailure {
    pub attempts: Vec<Attempt>,
}

impl ChainFailure {
    pub fn remote_error(&self) -> Option<&RemoteError> {
        self.attempts.iter().rev().find_map(|attempt| match &attempt.decline {
            Decline::Remote(err) => Some(err),
            _ => None,
        })
    }

    /// One-line message shown to the user.
    pub fn user_message(&self) -> String {
        match self.remote_error() {
            Some(err) => format!("Refinement failed: {err}"),
            None => "Refinement failed: the instruction could not be applied".to_owned(),
        }
    }
}

impl fmt::Display for ChainFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_message())
    }
}

impl std::error::Error for ChainFailure {}

pub struct ResolutionChain {
    tiers: Vec<Box<dyn Tier>>,
}

impl ResolutionChain {
    pub fn new() -> Self {
        Self { tiers: Vec::new() }
    }

    /// Patcher, then refinement with `memory` entries, then the remote generator.
    pub fn standard(memory: usize, generator: Arc<dyn RemoteGenerator>) -> Self {
        Self::new()
            .with_tier(CommandPatcher::new())
            .with_tier(RefinementEngine::new(memory))
            .with_tier(RemoteTier::new(generator))
    }

    pub fn with_tier(mut self, tier: impl Tier + 'static) -> Self {
        self.tiers.push(Box::new(tier));
        self
    }

    pub fn tier_kinds(&self) -> Vec<TierKind> {
        self.tiers.iter().map(|tier| tier.kind()).collect()
    }

    pub async fn resolve(
        &mut self,
        document: &Blueprint,
        instruction: &Instruction,
        context: &BusinessContext,
    ) -> Result<Resolution, ChainFailure> {
        let mut attempts = Vec::new();
        for tier in &mut self.tiers {
            let kind = tier.kind();
            let decline = match tier.resolve(document, instruction, context).await {
                Ok(resolution) if !resolution.delta.is_empty() => return Ok(resolution),
                // Handled but no-op is treated as not handled.
                Ok(_) => unchanged_decline(kind),
                Err(decline) => decline,
            };
            tracing::debug!(tier = %kind, %decline, "tier declined instruction");
            attempts.push(Attempt { tier: kind, decline });
        }
        Err(ChainFailure { attempts })
    }

    pub fn observe(&mut self, applied: &AppliedInstruction) {
        for tier in &mut self.tiers {
            tier.observe(applied);
        }
    }

    pub fn reset(&mut self) {
        for tier in &mut self.tiers {
            tier.reset();
        }
    }
}

impl Default for ResolutionChain {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ResolutionChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionChain").field("tiers", &self.tier_kinds()).finish()
    }
}

fn unchanged_decline(kind: TierKind) -> Decline {
    match kind {
        TierKind::Patcher => Decline::PatchNotApplicable,
        TierKind::Refinement => {
            Decline::RefinementAmbiguous { reason: "the edit would not change anything".to_owned() }
        }
        TierKind::Remote => Decline::Remote(RemoteError::Rejected {
            message: "the generator returned an unchanged document".to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests;

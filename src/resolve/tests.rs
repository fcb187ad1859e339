// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use super::{
    AppliedInstruction, BusinessContext, Decline, Instruction, RemoteError, ResolutionChain,
    TierKind, DEFAULT_REFINEMENT_MEMORY,
};
use crate::history::Snapshot;
use crate::memory::ScriptedGenerator;
use crate::model::fixtures::sample_blueprint;
use crate::resolve::GenerationError;

fn context() -> BusinessContext {
    BusinessContext {
        name: "Rosie's Bakery".to_owned(),
        niche: "bakery".to_owned(),
        locale: "en-GB".to_owned(),
    }
}

fn chain(generator: Arc<ScriptedGenerator>) -> ResolutionChain {
    ResolutionChain::standard(DEFAULT_REFINEMENT_MEMORY, generator)
}

#[test]
fn instruction_strips_politeness_but_keeps_case() {
    let instruction = Instruction::new("  Please   change the headline to 'Hi There'!  ");
    assert_eq!(instruction.text(), "Please   change the headline to 'Hi There'!");
    assert_eq!(instruction.command(), "change the headline to 'Hi There'");
    assert_eq!(instruction.normalized(), "change the headline to 'hi there'");
}

#[test]
fn trailing_values_keep_what_the_user_typed() {
    let instruction = Instruction::new("change the headline to Hello!");
    assert_eq!(instruction.command(), "change the headline to Hello");
    assert_eq!(instruction.trailing_value("Hello"), "Hello!");

    let instruction = Instruction::new("change the headline to 'Hello'!");
    assert_eq!(instruction.trailing_value("'Hello'"), "Hello");

    let instruction = Instruction::new("set the tagline to Fresh daily?! .");
    assert_eq!(instruction.trailing_value("Fresh daily"), "Fresh daily?!");

    let instruction = Instruction::new("rename the business to Rosie's.");
    assert_eq!(instruction.trailing_value("Rosie's"), "Rosie's");
}

#[test]
fn standard_chain_orders_tiers() {
    let chain = chain(Arc::new(ScriptedGenerator::succeeding(sample_blueprint())));
    assert_eq!(chain.tier_kinds(), vec![TierKind::Patcher, TierKind::Refinement, TierKind::Remote]);
}

#[tokio::test]
async fn patcher_match_never_reaches_remote() {
    let generator = Arc::new(ScriptedGenerator::succeeding(sample_blueprint()));
    let mut chain = chain(generator.clone());
    let document = sample_blueprint();

    let resolution = chain
        .resolve(&document, &Instruction::new("make it blue"), &context())
        .await
        .expect("resolution");
    assert_eq!(resolution.tier, TierKind::Patcher);
    assert_eq!(resolution.ops.len(), 2);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn unresolved_instruction_calls_remote_exactly_once() {
    let generator = Arc::new(ScriptedGenerator::failing(GenerationError::Quota {
        message: "daily limit".to_owned(),
    }));
    let mut chain = chain(generator.clone());
    let document = sample_blueprint();
    let before = document.clone();

    let failure = chain
        .resolve(&document, &Instruction::new("add a seasonal menu page"), &context())
        .await
        .unwrap_err();

    assert_eq!(generator.calls(), 1);
    assert_eq!(generator.last_instruction().as_deref(), Some("add a seasonal menu page"));
    assert_eq!(document, before);

    let tiers = failure.attempts.iter().map(|attempt| attempt.tier).collect::<Vec<_>>();
    assert_eq!(tiers, vec![TierKind::Patcher, TierKind::Refinement, TierKind::Remote]);
    assert_eq!(failure.attempts[0].decline, Decline::PatchNotApplicable);
    assert!(matches!(failure.remote_error(), Some(RemoteError::Rejected { .. })));
    assert!(failure.user_message().starts_with("Refinement failed"));
}

#[tokio::test]
async fn handled_but_unchanged_falls_through() {
    let mut remote_output = sample_blueprint();
    remote_output.set_name("Generated");
    let generator = Arc::new(ScriptedGenerator::succeeding(remote_output));
    let mut chain = chain(generator.clone());

    let blue = chain
        .resolve(&sample_blueprint(), &Instruction::new("make it blue"), &context())
        .await
        .expect("blue")
        .document;

    let resolution = chain
        .resolve(&blue, &Instruction::new("make it blue"), &context())
        .await
        .expect("resolution");
    assert_eq!(resolution.tier, TierKind::Remote);
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn remote_returning_the_same_document_is_a_failure() {
    let document = sample_blueprint();
    let generator = Arc::new(ScriptedGenerator::succeeding(document.clone()));
    let mut chain = chain(generator);

    let failure = chain
        .resolve(&document, &Instruction::new("surprise me"), &context())
        .await
        .unwrap_err();
    assert!(matches!(failure.remote_error(), Some(RemoteError::Rejected { .. })));
}

#[tokio::test]
async fn remote_page_title_change_is_accepted() {
    let document = sample_blueprint();
    let home = document.home_page_slug().clone();
    let mut remote_output = document.clone();
    remote_output.page_mut(&home).expect("home page").set_title("Start");
    let generator = Arc::new(ScriptedGenerator::succeeding(remote_output));
    let mut chain = chain(generator.clone());

    let resolution = chain
        .resolve(&document, &Instruction::new("call the home page Start"), &context())
        .await
        .expect("resolution");
    assert_eq!(resolution.tier, TierKind::Remote);
    assert!(resolution.delta.pages);
    assert_eq!(resolution.document.page(&home).expect("home page").title(), "Start");
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn observed_instructions_feed_refinement() {
    let generator = Arc::new(ScriptedGenerator::failing(GenerationError::Network {
        message: "offline".to_owned(),
    }));
    let mut chain = chain(generator.clone());
    let original = sample_blueprint();

    let instruction = Instruction::new("make it green");
    let resolution = chain.resolve(&original, &instruction, &context()).await.expect("green");
    chain.observe(&AppliedInstruction {
        instruction,
        tier: resolution.tier,
        before: Snapshot::new(original.clone()),
        after: Snapshot::new(resolution.document.clone()),
        ops: resolution.ops.clone(),
        delta: resolution.delta.clone(),
    });

    let reverted = chain
        .resolve(&resolution.document, &Instruction::new("change it back"), &context())
        .await
        .expect("revert");
    assert_eq!(reverted.tier, TierKind::Refinement);
    assert_eq!(reverted.document, original);
    assert_eq!(generator.calls(), 0);

    chain.reset();
    let failure = chain
        .resolve(&resolution.document, &Instruction::new("change it back"), &context())
        .await
        .unwrap_err();
    assert!(matches!(failure.remote_error(), Some(RemoteError::Unavailable { .. })));
    assert_eq!(generator.calls(), 1);
}

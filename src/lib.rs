// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Blueprint Studio: the editing engine behind generated website blueprints.
//!
//! A session keeps an undoable history of the document, resolves free-text instructions
//! through a local patcher, a conversational refinement engine and a remote generator, saves
//! the latest document after a quiet period and removes uploads that edits orphaned.

pub mod assets;
pub mod config;
pub mod history;
pub mod logging;
pub mod mcp;
pub mod memory;
pub mod model;
pub mod notice;
pub mod ops;
pub mod persist;
pub mod preview;
pub mod resolve;
pub mod session;
pub mod store;

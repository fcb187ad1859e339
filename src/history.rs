// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Bounded undo/redo history of immutable document snapshots.

use std::collections::VecDeque;
use std::ops::Deref;
use std::sync::Arc;

use crate::model::Blueprint;

pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Immutable point-in-time copy of a blueprint.
///
/// Cloning a snapshot shares the underlying value; editing starts from [`Snapshot::to_blueprint`],
/// which deep-copies, so a snapshot can never change after it was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot(Arc<Blueprint>);

impl Snapshot {
    pub fn new(document: Blueprint) -> Self {
        Self(Arc::new(document))
    }

    pub fn to_blueprint(&self) -> Blueprint {
        Blueprint::clone(&self.0)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for Snapshot {
    type Target = Blueprint;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Blueprint> for Snapshot {
    fn from(value: Blueprint) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone)]
pub struct HistoryStore {
    current: Snapshot,
    // Most recent last.
    past: VecDeque<Snapshot>,
    // Next redo first.
    future: VecDeque<Snapshot>,
    limit: usize,
    revision: u64,
}

impl HistoryStore {
    pub fn new(initial: Blueprint, limit: usize) -> Self {
        Self {
            current: Snapshot::new(initial),
            past: VecDeque::new(),
            future: VecDeque::new(),
            limit: limit.max(1),
            revision: 0,
        }
    }

    pub fn current(&self) -> &Snapshot {
        &self.current
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Monotonic counter bumped by every transition that changes the current document.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    /// Every version undo or redo can still reach, current included.
    pub fn snapshots(&self) -> impl Iterator<Item = &Snapshot> {
        self.past.iter().chain(std::iter::once(&self.current)).chain(self.future.iter())
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Installs `document` as current and records the previous one for undo.
    pub fn commit(&mut self, document: Blueprint) -> &Snapshot {
        let previous = std::mem::replace(&mut self.current, Snapshot::new(document));
        self.past.push_back(previous);
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
        self.future.clear();
        self.revision += 1;
        &self.current
    }

    /// Replaces the current document without touching past or future.
    pub fn commit_silent(&mut self, document: Blueprint) -> &Snapshot {
        self.current = Snapshot::new(document);
        self.revision += 1;
        &self.current
    }

    pub fn undo(&mut self) -> Option<&Snapshot> {
        let previous = self.past.pop_back()?;
        let current = std::mem::replace(&mut self.current, previous);
        self.future.push_front(current);
        self.future.truncate(self.limit);
        self.revision += 1;
        Some(&self.current)
    }

    pub fn redo(&mut self) -> Option<&Snapshot> {
        let next = self.future.pop_front()?;
        let current = std::mem::replace(&mut self.current, next);
        self.past.push_back(current);
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
        self.revision += 1;
        Some(&self.current)
    }
}

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Live preview broadcast.
//!
//! Messages are fire-and-forget: a preview that is not listening, or that lags behind, never
//! blocks or fails an edit.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::model::Blueprint;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PreviewMessage {
    BlueprintUpdate { document: Blueprint },
    Command { instruction: String },
}

pub trait PreviewChannel: Send + Sync {
    fn publish(&self, message: PreviewMessage);
}

pub const DEFAULT_PREVIEW_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
pub struct BroadcastPreview {
    tx: broadcast::Sender<PreviewMessage>,
}

impl BroadcastPreview {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PreviewMessage> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastPreview {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_CAPACITY)
    }
}

impl PreviewChannel for BroadcastPreview {
    fn publish(&self, message: PreviewMessage) {
        // No receivers is not an error.
        let _ = self.tx.send(message);
    }
}

#[cfg(test)]
mod tests {
    use super::{BroadcastPreview, PreviewChannel, PreviewMessage};
    use crate::model::fixtures::sample_blueprint;

    #[test]
    fn messages_use_kebab_case_type_tags() {
        let json = serde_json::to_value(PreviewMessage::Command { instruction: "make it blue".to_owned() })
            .expect("serialize");
        assert_eq!(json, serde_json::json!({ "type": "command", "instruction": "make it blue" }));

        let json = serde_json::to_value(PreviewMessage::BlueprintUpdate { document: sample_blueprint() })
            .expect("serialize");
        assert_eq!(json["type"], "blueprint-update");
        assert_eq!(json["document"]["name"], "Rosie's Bakery");
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        let preview = BroadcastPreview::default();
        preview.publish(PreviewMessage::Command { instruction: "hi".to_owned() });
        assert_eq!(preview.receiver_count(), 0);
    }

    #[test]
    fn subscribers_receive_published_messages() {
        let preview = BroadcastPreview::default();
        let mut rx = preview.subscribe();
        preview.publish(PreviewMessage::Command { instruction: "hi".to_owned() });
        assert_eq!(
            rx.try_recv().expect("message"),
            PreviewMessage::Command { instruction: "hi".to_owned() }
        );
    }
}

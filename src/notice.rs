// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! User-facing notices (toasts).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::resolve::TierKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    Applied { tier: TierKind, message: String },
    RefinementFailed { message: String },
    SignInRequired,
    Saved { at: DateTime<Utc> },
    SaveFailed { message: String },
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Forwards notices to a receiver owned by the surface that shows them.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        // A closed receiver means nobody is watching anymore.
        let _ = self.tx.send(notice);
    }
}

/// Writes notices to the log. Used when no interactive surface is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match &notice {
            Notice::RefinementFailed { message } | Notice::SaveFailed { message } => {
                tracing::warn!(%message, "notice");
            }
            Notice::SignInRequired => tracing::warn!("notice: sign in required"),
            Notice::Applied { tier, message } => tracing::info!(%tier, %message, "notice"),
            Notice::Saved { at } => tracing::info!(%at, "notice: saved"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ChannelNotifier, Notice, Notifier};
    use crate::resolve::TierKind;

    #[test]
    fn channel_notifier_delivers_in_order() {
        let (notifier, mut rx) = ChannelNotifier::new();
        notifier.notify(Notice::Applied { tier: TierKind::Patcher, message: "ok".to_owned() });
        notifier.notify(Notice::SignInRequired);

        assert_eq!(
            rx.try_recv().expect("first"),
            Notice::Applied { tier: TierKind::Patcher, message: "ok".to_owned() }
        );
        assert_eq!(rx.try_recv().expect("second"), Notice::SignInRequired);
    }

    #[test]
    fn notices_serialize_with_kind_tag() {
        let json = serde_json::to_value(Notice::SaveFailed { message: "disk full".to_owned() })
            .expect("serialize");
        assert_eq!(json, serde_json::json!({ "kind": "save_failed", "message": "disk full" }));
    }

    #[test]
    fn dropped_receiver_is_ignored() {
        let (notifier, rx) = ChannelNotifier::new();
        drop(rx);
        notifier.notify(Notice::SignInRequired);
    }
}

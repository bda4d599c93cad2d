//! Append-only action history. The ordered entries for an application are the
//! source of truth for what happened, when, and by whom; current application
//! state is a projection over them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ActorId, ApplicationStatus, ClientMeta};

/// Fixed action vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Created,
    StatusChanged,
    PaymentConfirmed,
    PaymentMarkedUnpaid,
    DocumentRecorded,
    DocumentVerified,
    DocumentRejected,
    DocumentReuploaded,
    StaffAssigned,
    TechnicalStaffAssigned,
}

impl ActionKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::StatusChanged => "status_changed",
            Self::PaymentConfirmed => "payment_confirmed",
            Self::PaymentMarkedUnpaid => "payment_marked_unpaid",
            Self::DocumentRecorded => "document_recorded",
            Self::DocumentVerified => "document_verified",
            Self::DocumentRejected => "document_rejected",
            Self::DocumentReuploaded => "document_reuploaded",
            Self::StaffAssigned => "staff_assigned",
            Self::TechnicalStaffAssigned => "technical_staff_assigned",
        }
    }
}

/// Immutable audit record of one action. Status fields are populated only for
/// entries that moved the application between statuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub action: ActionKind,
    pub old_status: Option<ApplicationStatus>,
    pub new_status: Option<ApplicationStatus>,
    pub actor: ActorId,
    pub reason: Option<String>,
    pub note: Option<String>,
    pub client: ClientMeta,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history entry requires an actor")]
    MissingActor,
}

/// Ordered, append-only container. No update or delete surface exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionHistory {
    entries: Vec<HistoryEntry>,
}

impl ActionHistory {
    pub fn append(&mut self, entry: HistoryEntry) -> Result<(), HistoryError> {
        if entry.actor.0.trim().is_empty() {
            return Err(HistoryError::MissingActor);
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Entries in ascending creation order.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replay the recorded transitions to reconstruct the current status.
    /// Used as an audit oracle: the result must always match the stored
    /// application status.
    pub fn replay_status(&self) -> Option<ApplicationStatus> {
        self.entries
            .iter()
            .filter_map(|entry| entry.new_status)
            .last()
    }
}

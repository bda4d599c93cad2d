//! Multi-stage review workflow for zoning clearance applications.
//!
//! An application moves `pending → initial_review → technical_review →
//! awaiting_approval → approved`, with `rejected` and `requires_changes`
//! reachable as side exits. Transitions are gated by payment state and by
//! per-document verification, and every action lands in an append-only
//! history log.

pub mod documents;
pub mod domain;
pub mod history;
pub mod repository;
pub mod router;
pub mod service;
pub mod transitions;

#[cfg(test)]
mod tests;

pub use documents::{
    stage_complete, DocumentId, DocumentRecord, DocumentType, FileMetadata, VerificationStatus,
};
pub use domain::{
    Actor, ActorId, ActorRole, ApplicantProfile, Application, ApplicationId, ApplicationStatus,
    ClientMeta, DocumentUpload, PaymentStatus, ProgramKind, RequestContext, ReviewStage,
    StageTimestamps, ZoningSubmission,
};
pub use history::{ActionHistory, ActionKind, HistoryEntry};
pub use repository::{ApplicationRecord, ApplicationRepository, ApplicationView, RepositoryError};
pub use router::zoning_router;
pub use service::{WorkflowError, ZoningWorkflowService};
pub use transitions::{ReviewAction, TransitionEdge, TransitionGuard, EDGES};

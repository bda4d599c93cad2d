//! The single transition table. Every legal edge of the review workflow is
//! listed here and nowhere else; the service consults this table through one
//! generic entry point.

use serde::{Deserialize, Serialize};

use super::domain::{ActorRole, ApplicationStatus, ReviewStage};

/// Staff-driven actions that move an application between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    StartInitialReview,
    ForwardToTechnical,
    ReturnToZoning,
    Approve,
    Reject,
    RequestChanges,
}

impl ReviewAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::StartInitialReview => "start_initial_review",
            Self::ForwardToTechnical => "forward_to_technical",
            Self::ReturnToZoning => "return_to_zoning",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::RequestChanges => "request_changes",
        }
    }
}

/// Precondition attached to an edge, checked after the from-status match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionGuard {
    /// Payment must be confirmed.
    PaymentConfirmed,
    /// Every ledger record of the stage must be approved, and the stage must
    /// hold at least one record.
    StageDocumentsApproved(ReviewStage),
    /// A non-empty reviewer-supplied reason must accompany the call.
    ReasonProvided,
    /// Role authorization only.
    None,
}

/// One row of the legal-edge table.
#[derive(Debug, Clone, Copy)]
pub struct TransitionEdge {
    pub action: ReviewAction,
    pub from: &'static [ApplicationStatus],
    pub to: ApplicationStatus,
    pub guard: TransitionGuard,
    pub allowed_roles: &'static [ActorRole],
}

const ACTIVE_REVIEW: &[ApplicationStatus] = &[
    ApplicationStatus::Pending,
    ApplicationStatus::InitialReview,
    ApplicationStatus::TechnicalReview,
];

pub const EDGES: &[TransitionEdge] = &[
    TransitionEdge {
        action: ReviewAction::StartInitialReview,
        from: &[ApplicationStatus::Pending],
        to: ApplicationStatus::InitialReview,
        guard: TransitionGuard::PaymentConfirmed,
        allowed_roles: &[ActorRole::ZoningOfficer, ActorRole::Administrator],
    },
    TransitionEdge {
        action: ReviewAction::ForwardToTechnical,
        from: &[ApplicationStatus::InitialReview],
        to: ApplicationStatus::TechnicalReview,
        guard: TransitionGuard::StageDocumentsApproved(ReviewStage::Zoning),
        allowed_roles: &[ActorRole::ZoningOfficer, ActorRole::Administrator],
    },
    TransitionEdge {
        action: ReviewAction::ReturnToZoning,
        from: &[ApplicationStatus::TechnicalReview],
        to: ApplicationStatus::AwaitingApproval,
        guard: TransitionGuard::StageDocumentsApproved(ReviewStage::Technical),
        allowed_roles: &[ActorRole::TechnicalReviewer, ActorRole::Administrator],
    },
    TransitionEdge {
        action: ReviewAction::Approve,
        from: &[ApplicationStatus::AwaitingApproval],
        to: ApplicationStatus::Approved,
        guard: TransitionGuard::None,
        allowed_roles: &[ActorRole::ZoningOfficer, ActorRole::Administrator],
    },
    TransitionEdge {
        action: ReviewAction::Reject,
        from: ACTIVE_REVIEW,
        to: ApplicationStatus::Rejected,
        guard: TransitionGuard::ReasonProvided,
        allowed_roles: &[
            ActorRole::ZoningOfficer,
            ActorRole::TechnicalReviewer,
            ActorRole::Administrator,
        ],
    },
    TransitionEdge {
        action: ReviewAction::RequestChanges,
        from: ACTIVE_REVIEW,
        to: ApplicationStatus::RequiresChanges,
        guard: TransitionGuard::ReasonProvided,
        allowed_roles: &[
            ActorRole::ZoningOfficer,
            ActorRole::TechnicalReviewer,
            ActorRole::Administrator,
        ],
    },
];

/// Look up the single edge for an action.
pub fn edge_for(action: ReviewAction) -> &'static TransitionEdge {
    EDGES
        .iter()
        .find(|edge| edge.action == action)
        .unwrap_or_else(|| unreachable!("every action has exactly one edge"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_action_has_exactly_one_edge() {
        for action in [
            ReviewAction::StartInitialReview,
            ReviewAction::ForwardToTechnical,
            ReviewAction::ReturnToZoning,
            ReviewAction::Approve,
            ReviewAction::Reject,
            ReviewAction::RequestChanges,
        ] {
            let count = EDGES.iter().filter(|edge| edge.action == action).count();
            assert_eq!(count, 1, "{} must appear once", action.label());
        }
    }

    #[test]
    fn terminal_statuses_have_no_outgoing_edges() {
        for edge in EDGES {
            assert!(!edge.from.contains(&ApplicationStatus::Approved));
            assert!(!edge.from.contains(&ApplicationStatus::Rejected));
        }
    }

    #[test]
    fn side_exits_cover_all_active_review_statuses() {
        let reject = edge_for(ReviewAction::Reject);
        assert_eq!(reject.from.len(), 3);
        assert_eq!(reject.to, ApplicationStatus::Rejected);

        let changes = edge_for(ReviewAction::RequestChanges);
        assert_eq!(changes.from, reject.from);
        assert_eq!(changes.to, ApplicationStatus::RequiresChanges);
    }
}

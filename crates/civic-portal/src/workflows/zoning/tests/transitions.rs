use super::common::*;
use crate::workflows::zoning::domain::ApplicationStatus;
use crate::workflows::zoning::service::WorkflowError;
use crate::workflows::zoning::transitions::{ReviewAction, EDGES};

#[test]
fn request_changes_is_reachable_from_initial_review() {
    let (service, _) = build_service();
    let id = submitted_application(&service);
    let officer = officer_ctx();

    service
        .confirm_payment(&officer, &id)
        .expect("payment confirms");
    service
        .apply(&officer, &id, ReviewAction::StartInitialReview, None)
        .expect("initial review starts");

    let updated = service
        .apply(
            &officer,
            &id,
            ReviewAction::RequestChanges,
            Some("site plan must show the road setback".to_string()),
        )
        .expect("changes requested");
    assert_eq!(
        updated.application.status,
        ApplicationStatus::RequiresChanges
    );
}

#[test]
fn reject_is_reachable_from_technical_review() {
    let (service, _) = build_service();
    let id = application_in_technical_review(&service);

    let rejected = service
        .apply(
            &technical_ctx(),
            &id,
            ReviewAction::Reject,
            Some("structure exceeds the height limit for the zone".to_string()),
        )
        .expect("technical reviewer rejects");
    assert_eq!(rejected.application.status, ApplicationStatus::Rejected);
}

#[test]
fn requires_changes_ends_the_application_run() {
    // No edge leaves requires_changes; the applicant answers the remarks
    // with a fresh submission under a new number.
    for edge in EDGES {
        assert!(!edge.from.contains(&ApplicationStatus::RequiresChanges));
    }
    assert!(ApplicationStatus::RequiresChanges.is_terminal());

    let (service, _) = build_service();
    let id = submitted_application(&service);
    service
        .apply(
            &officer_ctx(),
            &id,
            ReviewAction::RequestChanges,
            Some("resubmit with the road setback shown".to_string()),
        )
        .expect("changes requested");

    match service.apply(&admin_ctx(), &id, ReviewAction::StartInitialReview, None) {
        Err(WorkflowError::GuardNotSatisfied { reason, .. }) => {
            assert!(reason.contains("requires_changes"));
        }
        other => panic!("expected guard failure, got {other:?}"),
    }
}

#[test]
fn rejected_application_accepts_no_further_transitions() {
    let (service, _) = build_service();
    let id = submitted_application(&service);
    let officer = officer_ctx();

    service
        .apply(
            &officer,
            &id,
            ReviewAction::Reject,
            Some("duplicate filing".to_string()),
        )
        .expect("rejects");

    for action in [
        ReviewAction::StartInitialReview,
        ReviewAction::ForwardToTechnical,
        ReviewAction::ReturnToZoning,
        ReviewAction::Approve,
        ReviewAction::Reject,
        ReviewAction::RequestChanges,
    ] {
        match service.apply(&admin_ctx(), &id, action, Some("again".to_string())) {
            Err(WorkflowError::GuardNotSatisfied { reason, .. }) => {
                assert!(reason.contains("rejected"));
            }
            other => panic!("{} should be refused, got {other:?}", action.label()),
        }
    }
}

#[test]
fn return_to_zoning_requires_technical_documents_approved() {
    let (service, _) = build_service();
    let id = application_in_technical_review(&service);

    // The technical-stage document is still pending.
    match service.apply(&technical_ctx(), &id, ReviewAction::ReturnToZoning, None) {
        Err(WorkflowError::GuardNotSatisfied { action, reason }) => {
            assert_eq!(action, "return_to_zoning");
            assert!(reason.contains("technical"));
        }
        other => panic!("expected guard failure, got {other:?}"),
    }
}

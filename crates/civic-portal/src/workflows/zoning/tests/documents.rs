use super::common::*;
use crate::workflows::zoning::repository::ApplicationRepository;
use crate::workflows::zoning::documents::{DocumentType, VerificationStatus};
use crate::workflows::zoning::domain::ApplicationStatus;
use crate::workflows::zoning::history::ActionKind;
use crate::workflows::zoning::service::WorkflowError;
use crate::workflows::zoning::transitions::ReviewAction;

#[test]
fn verify_requires_stage_custody() {
    let (service, _) = build_service();
    let id = submitted_application(&service);
    let docs = zoning_document_ids(&id);

    // Nobody holds zoning custody yet.
    match service.verify_document(&officer_ctx(), &id, &docs[0], None) {
        Err(WorkflowError::Authorization(message)) => {
            assert!(message.contains("custodian"));
        }
        other => panic!("expected authorization error, got {other:?}"),
    }
}

#[test]
fn administrator_bypasses_custody_check() {
    let (service, _) = build_service();
    let id = submitted_application(&service);
    let docs = zoning_document_ids(&id);

    let verified = service
        .verify_document(&admin_ctx(), &id, &docs[0], Some("clear copy".to_string()))
        .expect("admin verifies without custody");
    assert_eq!(verified.verification, VerificationStatus::Approved);
    assert_eq!(verified.remarks.as_deref(), Some("clear copy"));
}

#[test]
fn reverify_is_an_error_not_a_silent_noop() {
    let (service, _) = build_service();
    let id = submitted_application(&service);
    let docs = zoning_document_ids(&id);
    let admin = admin_ctx();

    service
        .verify_document(&admin, &id, &docs[0], None)
        .expect("first review passes");
    match service.verify_document(&admin, &id, &docs[0], None) {
        Err(WorkflowError::GuardNotSatisfied { reason, .. }) => {
            assert!(reason.contains("pending"));
        }
        other => panic!("expected guard failure, got {other:?}"),
    }
}

#[test]
fn document_rejection_requires_remarks_and_stores_them_verbatim() {
    let (service, repository) = build_service();
    let id = submitted_application(&service);
    let docs = zoning_document_ids(&id);
    let admin = admin_ctx();

    match service.reject_document(&admin, &id, &docs[0], "".to_string()) {
        Err(WorkflowError::Validation(message)) => assert!(message.contains("reason")),
        other => panic!("expected validation error, got {other:?}"),
    }

    let remarks = "site plan does not match the lot survey";
    let rejected = service
        .reject_document(&admin, &id, &docs[0], remarks.to_string())
        .expect("reject succeeds with remarks");
    assert_eq!(rejected.verification, VerificationStatus::Rejected);
    assert_eq!(rejected.remarks.as_deref(), Some(remarks));

    let stored = repository.fetch(&id).unwrap().unwrap();
    let entry = stored.history.entries().last().unwrap();
    assert_eq!(entry.action, ActionKind::DocumentRejected);
    assert_eq!(entry.reason.as_deref(), Some(remarks));

    // Whitespace is part of the record: the stored remarks are exactly what
    // the reviewer typed, padding included.
    let padded = "  margin notes kept as typed  ";
    let rejected = service
        .reject_document(&admin, &id, &docs[1], padded.to_string())
        .expect("padded remarks accepted");
    assert_eq!(rejected.remarks.as_deref(), Some(padded));
}

#[test]
fn recorded_document_fills_a_missing_requirement() {
    let (service, repository) = build_service();
    let mut partial = submission();
    partial.documents.truncate(2); // zoning documents only
    let id = service
        .submit(&applicant_ctx(), partial)
        .expect("submission succeeds")
        .application
        .id;
    let officer = officer_ctx();
    let engineer = technical_ctx();

    service
        .confirm_payment(&officer, &id)
        .expect("payment confirms");
    service
        .assign_staff(&officer, &id, officer.actor.id.clone())
        .expect("custody assigned");
    service
        .apply(&officer, &id, ReviewAction::StartInitialReview, None)
        .expect("initial review starts");
    for doc in zoning_document_ids(&id) {
        service
            .verify_document(&officer, &id, &doc, None)
            .expect("zoning document verifies");
    }
    service
        .apply(&officer, &id, ReviewAction::ForwardToTechnical, None)
        .expect("forwards to technical");
    service
        .assign_technical_staff(&officer, &id, engineer.actor.id.clone())
        .expect("technical custody assigned");

    // With no technical record on the ledger the stage can never complete.
    match service.apply(&engineer, &id, ReviewAction::ReturnToZoning, None) {
        Err(WorkflowError::GuardNotSatisfied { action, .. }) => {
            assert_eq!(action, "return_to_zoning");
        }
        other => panic!("expected guard failure, got {other:?}"),
    }

    // Recording the missing document reopens the path.
    let recorded = service
        .record_document(
            &applicant_ctx(),
            &id,
            DocumentType::StructuralComputation,
            file("structural-computation.pdf"),
        )
        .expect("missing document records");
    assert_eq!(recorded.id.0, format!("{}-D3", id.0));
    assert_eq!(recorded.verification, VerificationStatus::Pending);

    service
        .verify_document(&engineer, &id, &recorded.id, None)
        .expect("recorded document verifies");
    let returned = service
        .apply(&engineer, &id, ReviewAction::ReturnToZoning, None)
        .expect("stage complete, returns to zoning");
    assert_eq!(
        returned.application.status,
        ApplicationStatus::AwaitingApproval
    );

    let stored = repository.fetch(&id).unwrap().unwrap();
    assert!(stored
        .history
        .entries()
        .iter()
        .any(|entry| entry.action == ActionKind::DocumentRecorded));
}

#[test]
fn record_document_refuses_a_duplicate_type() {
    let (service, _) = build_service();
    let id = submitted_application(&service);

    match service.record_document(
        &applicant_ctx(),
        &id,
        DocumentType::SitePlan,
        file("site-plan-again.pdf"),
    ) {
        Err(WorkflowError::Validation(message)) => assert!(message.contains("already exists")),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn settled_application_accepts_no_new_documents() {
    let (service, _) = build_service();
    let id = submitted_application(&service);
    service
        .apply(
            &officer_ctx(),
            &id,
            ReviewAction::Reject,
            Some("duplicate filing".to_string()),
        )
        .expect("rejects");

    match service.record_document(
        &applicant_ctx(),
        &id,
        DocumentType::BarangayClearance,
        file("barangay-clearance.pdf"),
    ) {
        Err(WorkflowError::GuardNotSatisfied { action, reason }) => {
            assert_eq!(action, "record_document");
            assert!(reason.contains("rejected"));
        }
        other => panic!("expected guard failure, got {other:?}"),
    }
}

#[test]
fn reupload_resets_review_and_is_logged() {
    let (service, repository) = build_service();
    let id = submitted_application(&service);
    let docs = zoning_document_ids(&id);
    let admin = admin_ctx();

    service
        .reject_document(&admin, &id, &docs[0], "illegible scan".to_string())
        .expect("rejects");
    let reuploaded = service
        .reupload_document(&applicant_ctx(), &id, &docs[0], file("site-plan-v2.pdf"))
        .expect("rejected document reuploads");

    assert_eq!(reuploaded.verification, VerificationStatus::Pending);
    assert!(reuploaded.reviewed_by.is_none());
    assert!(reuploaded.remarks.is_none());
    assert_eq!(reuploaded.file.file_name, "site-plan-v2.pdf");

    let stored = repository.fetch(&id).unwrap().unwrap();
    let entry = stored.history.entries().last().unwrap();
    assert_eq!(entry.action, ActionKind::DocumentReuploaded);
    assert_eq!(entry.note.as_deref(), Some(docs[0].0.as_str()));
}

#[test]
fn reupload_of_pending_document_is_refused() {
    let (service, _) = build_service();
    let id = submitted_application(&service);
    let docs = zoning_document_ids(&id);

    match service.reupload_document(&applicant_ctx(), &id, &docs[0], file("v2.pdf")) {
        Err(WorkflowError::GuardNotSatisfied { reason, .. }) => {
            assert!(reason.contains("rejected"));
        }
        other => panic!("expected guard failure, got {other:?}"),
    }
}

#[test]
fn unknown_document_is_not_found() {
    let (service, _) = build_service();
    let id = submitted_application(&service);

    let missing = crate::workflows::zoning::documents::DocumentId("ZC-000001-D9".to_string());
    assert!(matches!(
        service.verify_document(&admin_ctx(), &id, &missing, None),
        Err(WorkflowError::NotFound(_))
    ));
}

#[test]
fn failed_document_review_appends_no_history() {
    let (service, repository) = build_service();
    let id = submitted_application(&service);
    let docs = zoning_document_ids(&id);
    let before = repository.fetch(&id).unwrap().unwrap().history.len();

    service
        .reject_document(&admin_ctx(), &id, &docs[0], "   ".to_string())
        .expect_err("blank remarks refused");

    let after = repository.fetch(&id).unwrap().unwrap().history.len();
    assert_eq!(before, after);
}

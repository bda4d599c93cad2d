use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::zoning::documents::{DocumentId, DocumentType, FileMetadata};
use crate::workflows::zoning::domain::{
    Actor, ActorId, ActorRole, ApplicantProfile, ApplicationId, ClientMeta, DocumentUpload,
    RequestContext, ZoningSubmission,
};
use crate::workflows::zoning::repository::{
    ApplicationRecord, ApplicationRepository, RepositoryError,
};
use crate::workflows::zoning::router::zoning_router;
use crate::workflows::zoning::service::ZoningWorkflowService;
use crate::workflows::zoning::transitions::ReviewAction;

pub(super) fn file(name: &str) -> FileMetadata {
    FileMetadata {
        file_name: name.to_string(),
        storage_key: format!("store://zoning/{name}"),
    }
}

pub(super) fn applicant_profile() -> ApplicantProfile {
    ApplicantProfile {
        full_name: "Maria Dela Cruz".to_string(),
        contact_number: "+63-917-555-0147".to_string(),
        email: "maria.delacruz@example.ph".to_string(),
        barangay: "San Isidro".to_string(),
        project_description: "Two storey residential building".to_string(),
        project_location: "Lot 4, Block 7, San Isidro".to_string(),
        land_area_sqm: 120.0,
    }
}

/// Two zoning-stage documents and one technical-stage document, enough to
/// exercise both stage gates.
pub(super) fn submission() -> ZoningSubmission {
    ZoningSubmission {
        applicant: applicant_profile(),
        documents: vec![
            DocumentUpload {
                document_type: DocumentType::SitePlan,
                file: file("site-plan.pdf"),
            },
            DocumentUpload {
                document_type: DocumentType::TaxDeclaration,
                file: file("tax-declaration.pdf"),
            },
            DocumentUpload {
                document_type: DocumentType::BuildingPlan,
                file: file("building-plan.pdf"),
            },
        ],
    }
}

pub(super) fn ctx(id: &str, role: ActorRole) -> RequestContext {
    RequestContext {
        actor: Actor {
            id: ActorId(id.to_string()),
            role,
        },
        client: ClientMeta {
            ip: "203.0.113.20".to_string(),
            user_agent: "portal-tests".to_string(),
        },
    }
}

pub(super) fn applicant_ctx() -> RequestContext {
    ctx("citizen-1", ActorRole::Applicant)
}

pub(super) fn officer_ctx() -> RequestContext {
    ctx("zoning-officer-1", ActorRole::ZoningOfficer)
}

pub(super) fn technical_ctx() -> RequestContext {
    ctx("engineer-1", ActorRole::TechnicalReviewer)
}

pub(super) fn admin_ctx() -> RequestContext {
    ctx("admin-1", ActorRole::Administrator)
}

pub(super) fn build_service() -> (
    ZoningWorkflowService<MemoryRepository>,
    Arc<MemoryRepository>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let service = ZoningWorkflowService::new(repository.clone());
    (service, repository)
}

/// Submit and walk an application to `technical_review`: confirm payment,
/// start initial review, verify both zoning documents, forward.
pub(super) fn application_in_technical_review(
    service: &ZoningWorkflowService<MemoryRepository>,
) -> ApplicationId {
    let id = submitted_application(service);
    let officer = officer_ctx();

    service
        .confirm_payment(&officer, &id)
        .expect("payment confirms");
    service
        .assign_staff(&officer, &id, officer.actor.id.clone())
        .expect("zoning custody assigned");
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
    id
}

pub(super) fn submitted_application(
    service: &ZoningWorkflowService<MemoryRepository>,
) -> ApplicationId {
    service
        .submit(&applicant_ctx(), submission())
        .expect("submission succeeds")
        .application
        .id
}

/// Document ids follow the submission order in [`submission`].
pub(super) fn zoning_document_ids(id: &ApplicationId) -> Vec<DocumentId> {
    vec![
        DocumentId(format!("{}-D1", id.0)),
        DocumentId(format!("{}-D2", id.0)),
    ]
}

pub(super) fn technical_document_id(id: &ApplicationId) -> DocumentId {
    DocumentId(format!("{}-D3", id.0))
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl ApplicationRepository for MemoryRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.application.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.application.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: ApplicationRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.application.id) {
            guard.insert(record.application.id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut records: Vec<ApplicationRecord> = guard.values().cloned().collect();
        records.sort_by(|a, b| a.application.id.cmp(&b.application.id));
        Ok(records)
    }
}

pub(super) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn insert(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: ApplicationRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn zoning_router_with_service(
    service: ZoningWorkflowService<MemoryRepository>,
) -> axum::Router {
    zoning_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::documents::{DocumentId, DocumentType, FileMetadata};
use super::domain::{
    Actor, ActorId, ActorRole, ApplicationId, ClientMeta, RequestContext, ZoningSubmission,
};
use super::repository::{ApplicationRepository, RepositoryError};
use super::service::{WorkflowError, ZoningWorkflowService};
use super::transitions::ReviewAction;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RemarksBody {
    pub(crate) remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignBody {
    pub(crate) staff_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecordDocumentBody {
    pub(crate) document_type: DocumentType,
    #[serde(flatten)]
    pub(crate) file: FileMetadata,
}

/// Router exposing the review workflow under `/api/v1/zoning`.
pub fn zoning_router<R>(service: Arc<ZoningWorkflowService<R>>) -> Router
where
    R: ApplicationRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/zoning/applications",
            post(submit_handler::<R>).get(list_handler::<R>),
        )
        .route(
            "/api/v1/zoning/applications/:id",
            get(application_handler::<R>),
        )
        .route(
            "/api/v1/zoning/applications/:id/documents",
            post(record_document_handler::<R>),
        )
        .route(
            "/api/v1/zoning/applications/:id/history",
            get(history_handler::<R>),
        )
        .route(
            "/api/v1/zoning/applications/:id/start-initial-review",
            post(start_initial_review_handler::<R>),
        )
        .route(
            "/api/v1/zoning/applications/:id/forward-to-technical",
            post(forward_to_technical_handler::<R>),
        )
        .route(
            "/api/v1/zoning/applications/:id/return-to-zoning",
            post(return_to_zoning_handler::<R>),
        )
        .route(
            "/api/v1/zoning/applications/:id/approve",
            post(approve_handler::<R>),
        )
        .route(
            "/api/v1/zoning/applications/:id/reject",
            post(reject_handler::<R>),
        )
        .route(
            "/api/v1/zoning/applications/:id/request-changes",
            post(request_changes_handler::<R>),
        )
        .route(
            "/api/v1/zoning/applications/:id/documents/:doc_id/verify",
            post(verify_document_handler::<R>),
        )
        .route(
            "/api/v1/zoning/applications/:id/documents/:doc_id/reject",
            post(reject_document_handler::<R>),
        )
        .route(
            "/api/v1/zoning/applications/:id/documents/:doc_id/reupload",
            post(reupload_document_handler::<R>),
        )
        .route(
            "/api/v1/zoning/applications/:id/payment/confirm",
            post(confirm_payment_handler::<R>),
        )
        .route(
            "/api/v1/zoning/applications/:id/payment/unpay",
            post(mark_unpaid_handler::<R>),
        )
        .route(
            "/api/v1/zoning/applications/:id/assign-staff",
            post(assign_staff_handler::<R>),
        )
        .route(
            "/api/v1/zoning/applications/:id/assign-technical-staff",
            post(assign_technical_staff_handler::<R>),
        )
        .with_state(service)
}

/// Resolve the acting party from the identity-provider headers and capture
/// client metadata for the audit trail.
pub(crate) fn request_context(headers: &HeaderMap) -> Result<RequestContext, WorkflowError> {
    let actor_id = header_value(headers, "x-actor-id")
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| {
            WorkflowError::Authorization("missing x-actor-id header".to_string())
        })?;
    let role = header_value(headers, "x-actor-role")
        .and_then(|value| ActorRole::parse(&value))
        .ok_or_else(|| {
            WorkflowError::Authorization(
                "missing or unrecognized x-actor-role header".to_string(),
            )
        })?;

    Ok(RequestContext {
        actor: Actor {
            id: ActorId(actor_id),
            role,
        },
        client: ClientMeta {
            ip: header_value(headers, "x-forwarded-for").unwrap_or_else(|| "unknown".to_string()),
            user_agent: header_value(headers, "user-agent")
                .unwrap_or_else(|| "unknown".to_string()),
        },
    })
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

pub(crate) fn error_response(error: WorkflowError) -> Response {
    let status = match &error {
        WorkflowError::GuardNotSatisfied { .. } | WorkflowError::Conflict => StatusCode::CONFLICT,
        WorkflowError::Validation(_) | WorkflowError::History(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
        WorkflowError::Authorization(_) => StatusCode::FORBIDDEN,
        WorkflowError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        WorkflowError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        WorkflowError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}

pub(crate) async fn submit_handler<R>(
    State(service): State<Arc<ZoningWorkflowService<R>>>,
    headers: HeaderMap,
    Json(submission): Json<ZoningSubmission>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    let result = request_context(&headers)
        .and_then(|ctx| service.submit(&ctx, submission));
    match result {
        Ok(record) => (StatusCode::CREATED, Json(record.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn application_handler<R>(
    State(service): State<Arc<ZoningWorkflowService<R>>>,
    Path(id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    match service.get(&ApplicationId(id)) {
        Ok(record) => (StatusCode::OK, Json(record.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<ZoningWorkflowService<R>>>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    match service.list() {
        Ok(records) => {
            let views: Vec<_> = records.iter().map(|record| record.view()).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn record_document_handler<R>(
    State(service): State<Arc<ZoningWorkflowService<R>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<RecordDocumentBody>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    let result = request_context(&headers).and_then(|ctx| {
        service.record_document(&ctx, &ApplicationId(id), body.document_type, body.file)
    });
    match result {
        Ok(document) => (StatusCode::CREATED, Json(document)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn history_handler<R>(
    State(service): State<Arc<ZoningWorkflowService<R>>>,
    Path(id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    match service.history(&ApplicationId(id)) {
        Ok(history) => (StatusCode::OK, Json(history.entries().to_vec())).into_response(),
        Err(error) => error_response(error),
    }
}

async fn transition<R>(
    service: Arc<ZoningWorkflowService<R>>,
    headers: HeaderMap,
    id: String,
    action: ReviewAction,
    body: Option<Json<RemarksBody>>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    let remarks = body.and_then(|Json(body)| body.remarks);
    let result = request_context(&headers)
        .and_then(|ctx| service.apply(&ctx, &ApplicationId(id), action, remarks));
    match result {
        Ok(record) => (StatusCode::OK, Json(record.view())).into_response(),
        Err(error) => error_response(error),
    }
}

macro_rules! transition_handler {
    ($name:ident, $action:expr) => {
        pub(crate) async fn $name<R>(
            State(service): State<Arc<ZoningWorkflowService<R>>>,
            Path(id): Path<String>,
            headers: HeaderMap,
            body: Option<Json<RemarksBody>>,
        ) -> Response
        where
            R: ApplicationRepository + 'static,
        {
            transition(service, headers, id, $action, body).await
        }
    };
}

transition_handler!(start_initial_review_handler, ReviewAction::StartInitialReview);
transition_handler!(forward_to_technical_handler, ReviewAction::ForwardToTechnical);
transition_handler!(return_to_zoning_handler, ReviewAction::ReturnToZoning);
transition_handler!(approve_handler, ReviewAction::Approve);
transition_handler!(reject_handler, ReviewAction::Reject);
transition_handler!(request_changes_handler, ReviewAction::RequestChanges);

pub(crate) async fn verify_document_handler<R>(
    State(service): State<Arc<ZoningWorkflowService<R>>>,
    Path((id, doc_id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Option<Json<RemarksBody>>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    let remarks = body.and_then(|Json(body)| body.remarks);
    let result = request_context(&headers).and_then(|ctx| {
        service.verify_document(&ctx, &ApplicationId(id), &DocumentId(doc_id), remarks)
    });
    match result {
        Ok(document) => (StatusCode::OK, Json(document)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reject_document_handler<R>(
    State(service): State<Arc<ZoningWorkflowService<R>>>,
    Path((id, doc_id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Option<Json<RemarksBody>>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    let remarks = body.and_then(|Json(body)| body.remarks).unwrap_or_default();
    let result = request_context(&headers).and_then(|ctx| {
        service.reject_document(&ctx, &ApplicationId(id), &DocumentId(doc_id), remarks)
    });
    match result {
        Ok(document) => (StatusCode::OK, Json(document)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reupload_document_handler<R>(
    State(service): State<Arc<ZoningWorkflowService<R>>>,
    Path((id, doc_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(file): Json<FileMetadata>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    let result = request_context(&headers).and_then(|ctx| {
        service.reupload_document(&ctx, &ApplicationId(id), &DocumentId(doc_id), file)
    });
    match result {
        Ok(document) => (StatusCode::OK, Json(document)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn confirm_payment_handler<R>(
    State(service): State<Arc<ZoningWorkflowService<R>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    let result =
        request_context(&headers).and_then(|ctx| service.confirm_payment(&ctx, &ApplicationId(id)));
    match result {
        Ok(record) => (StatusCode::OK, Json(record.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn mark_unpaid_handler<R>(
    State(service): State<Arc<ZoningWorkflowService<R>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    let result =
        request_context(&headers).and_then(|ctx| service.mark_unpaid(&ctx, &ApplicationId(id)));
    match result {
        Ok(record) => (StatusCode::OK, Json(record.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn assign_staff_handler<R>(
    State(service): State<Arc<ZoningWorkflowService<R>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<AssignBody>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    let result = request_context(&headers)
        .and_then(|ctx| service.assign_staff(&ctx, &ApplicationId(id), ActorId(body.staff_id)));
    match result {
        Ok(record) => (StatusCode::OK, Json(record.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn assign_technical_staff_handler<R>(
    State(service): State<Arc<ZoningWorkflowService<R>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<AssignBody>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    let result = request_context(&headers).and_then(|ctx| {
        service.assign_technical_staff(&ctx, &ApplicationId(id), ActorId(body.staff_id))
    });
    match result {
        Ok(record) => (StatusCode::OK, Json(record.view())).into_response(),
        Err(error) => error_response(error),
    }
}

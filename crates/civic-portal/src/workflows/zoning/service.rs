use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::info;

use super::documents::{
    stage_complete, DocumentError, DocumentId, DocumentRecord, DocumentType, FileMetadata,
};
use super::domain::{
    ActorId, ActorRole, Application, ApplicationId, ApplicationStatus, PaymentStatus, ProgramKind,
    RequestContext, ReviewStage, StageTimestamps, ZoningSubmission,
};
use super::history::{ActionHistory, ActionKind, HistoryEntry, HistoryError};
use super::repository::{ApplicationRecord, ApplicationRepository, RepositoryError};
use super::transitions::{edge_for, ReviewAction, TransitionGuard};

/// Error surface for every workflow operation. The router maps these onto
/// HTTP statuses; the messages are written for citizens and reviewers, so
/// they distinguish "not yet" from "bad input" from "not allowed".
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("cannot {action} yet: {reason}")]
    GuardNotSatisfied { action: &'static str, reason: String },
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("not allowed: {0}")]
    Authorization(String),
    #[error("application is being modified by another request, try again")]
    Conflict,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    History(#[from] HistoryError),
}

impl WorkflowError {
    fn document(action: &'static str, err: DocumentError) -> Self {
        WorkflowError::GuardNotSatisfied {
            action,
            reason: err.to_string(),
        }
    }
}

/// The review workflow engine for zoning clearance applications.
///
/// Every mutating operation runs under an exclusive per-application lock and
/// follows the same shape: fetch the aggregate, check authorization and
/// guards, mutate a working copy, append exactly the history entries the
/// operation owes, then persist with a single `update`. A failure at any
/// point before the update leaves no persisted change.
pub struct ZoningWorkflowService<R> {
    repository: Arc<R>,
    locks: Mutex<HashMap<ApplicationId, Arc<Mutex<()>>>>,
    sequence: AtomicU64,
}

impl<R> ZoningWorkflowService<R>
where
    R: ApplicationRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            locks: Mutex::new(HashMap::new()),
            sequence: AtomicU64::new(1),
        }
    }

    /// Intake a citizen submission: assign the next `ZC-` number, open the
    /// full document ledger in pending state, and record the `created` entry.
    pub fn submit(
        &self,
        ctx: &RequestContext,
        submission: ZoningSubmission,
    ) -> Result<ApplicationRecord, WorkflowError> {
        let program = ProgramKind::ZoningClearance;
        let catalogue = DocumentType::catalogue(program);

        let mut seen: Vec<DocumentType> = Vec::new();
        for upload in &submission.documents {
            if !catalogue.contains(&upload.document_type) {
                return Err(WorkflowError::Validation(format!(
                    "document type '{}' is not accepted for {}",
                    upload.document_type.label(),
                    program.label(),
                )));
            }
            if seen.contains(&upload.document_type) {
                return Err(WorkflowError::Validation(format!(
                    "document type '{}' was uploaded more than once",
                    upload.document_type.label(),
                )));
            }
            seen.push(upload.document_type);
        }

        let now = Utc::now();
        let id = ApplicationId::new(program, self.sequence.fetch_add(1, Ordering::Relaxed));

        let documents = submission
            .documents
            .into_iter()
            .enumerate()
            .map(|(index, upload)| {
                DocumentRecord::new(
                    DocumentId(format!("{}-D{}", id.0, index + 1)),
                    upload.document_type,
                    upload.file,
                )
            })
            .collect();

        let application = Application {
            id: id.clone(),
            program,
            status: ApplicationStatus::Pending,
            payment: PaymentStatus::Pending,
            custody: BTreeMap::new(),
            timestamps: StageTimestamps::at_submission(now),
            applicant: submission.applicant,
        };

        let mut history = ActionHistory::default();
        history.append(HistoryEntry {
            action: ActionKind::Created,
            old_status: None,
            new_status: Some(ApplicationStatus::Pending),
            actor: ctx.actor.id.clone(),
            reason: None,
            note: None,
            client: ctx.client.clone(),
            recorded_at: now,
        })?;

        let record = ApplicationRecord {
            application,
            documents,
            history,
        };

        let stored = self.repository.insert(record)?;
        info!(application = %stored.application.id.0, "application submitted");
        Ok(stored)
    }

    /// The single transition entry point. Consults the legal-edge table,
    /// checks the edge's guard, and commits the status change together with
    /// its `status_changed` history entry.
    pub fn apply(
        &self,
        ctx: &RequestContext,
        id: &ApplicationId,
        action: ReviewAction,
        remarks: Option<String>,
    ) -> Result<ApplicationRecord, WorkflowError> {
        let edge = edge_for(action);
        let remarks = presence(remarks);

        self.mutate(id, |record| {
            if !edge.allowed_roles.contains(&ctx.actor.role) {
                return Err(WorkflowError::Authorization(format!(
                    "role '{}' may not {}",
                    ctx.actor.role.label(),
                    action.label(),
                )));
            }

            let current = record.application.status;
            if !edge.from.contains(&current) {
                return Err(WorkflowError::GuardNotSatisfied {
                    action: action.label(),
                    reason: format!("application is {}", current.label()),
                });
            }

            match edge.guard {
                TransitionGuard::PaymentConfirmed => {
                    if record.application.payment != PaymentStatus::Confirmed {
                        return Err(WorkflowError::GuardNotSatisfied {
                            action: action.label(),
                            reason: "payment has not been confirmed".to_string(),
                        });
                    }
                }
                TransitionGuard::StageDocumentsApproved(stage) => {
                    if !stage_complete(&record.documents, stage) {
                        return Err(WorkflowError::GuardNotSatisfied {
                            action: action.label(),
                            reason: format!(
                                "not every {} stage document has been approved",
                                stage.label(),
                            ),
                        });
                    }
                }
                TransitionGuard::ReasonProvided => {
                    if remarks.is_none() {
                        return Err(WorkflowError::Validation(format!(
                            "{} requires a reason",
                            action.label(),
                        )));
                    }
                }
                TransitionGuard::None => {}
            }

            let now = Utc::now();
            record.application.status = edge.to;
            match action {
                ReviewAction::StartInitialReview => {
                    record.application.timestamps.initial_review_started_at = Some(now);
                }
                ReviewAction::ForwardToTechnical => {
                    record.application.timestamps.forwarded_to_technical_at = Some(now);
                }
                ReviewAction::ReturnToZoning => {
                    record.application.timestamps.returned_to_zoning_at = Some(now);
                }
                ReviewAction::Approve | ReviewAction::Reject => {
                    record.application.timestamps.decided_at = Some(now);
                }
                ReviewAction::RequestChanges => {}
            }

            record.history.append(HistoryEntry {
                action: ActionKind::StatusChanged,
                old_status: Some(current),
                new_status: Some(edge.to),
                actor: ctx.actor.id.clone(),
                reason: remarks.clone(),
                note: Some(action.label().to_string()),
                client: ctx.client.clone(),
                recorded_at: now,
            })?;

            info!(
                application = %record.application.id.0,
                from = current.label(),
                to = edge.to.label(),
                action = action.label(),
                "status changed"
            );
            Ok(record.clone())
        })
    }

    /// Open a ledger record for a document that was not part of the original
    /// submission, e.g. a technical requirement the applicant left out at
    /// intake. The catalogue still applies and each type may appear at most
    /// once per application.
    pub fn record_document(
        &self,
        ctx: &RequestContext,
        id: &ApplicationId,
        document_type: DocumentType,
        file: FileMetadata,
    ) -> Result<DocumentRecord, WorkflowError> {
        self.mutate(id, |record| {
            let program = record.application.program;
            if !DocumentType::catalogue(program).contains(&document_type) {
                return Err(WorkflowError::Validation(format!(
                    "document type '{}' is not accepted for {}",
                    document_type.label(),
                    program.label(),
                )));
            }
            if record
                .documents
                .iter()
                .any(|document| document.document_type == document_type)
            {
                return Err(WorkflowError::Validation(format!(
                    "a '{}' record already exists, reupload it instead",
                    document_type.label(),
                )));
            }
            if record.application.status.is_terminal() {
                return Err(WorkflowError::GuardNotSatisfied {
                    action: "record_document",
                    reason: format!("application is {}", record.application.status.label()),
                });
            }

            let now = Utc::now();
            let document_id = DocumentId(format!(
                "{}-D{}",
                record.application.id.0,
                record.documents.len() + 1,
            ));
            let document = DocumentRecord::new(document_id.clone(), document_type, file);
            record.documents.push(document.clone());

            record.history.append(HistoryEntry {
                action: ActionKind::DocumentRecorded,
                old_status: None,
                new_status: None,
                actor: ctx.actor.id.clone(),
                reason: None,
                note: Some(document_id.0),
                client: ctx.client.clone(),
                recorded_at: now,
            })?;
            Ok(document)
        })
    }

    /// Approve a pending document. The reviewer must hold custody of the
    /// document's stage.
    pub fn verify_document(
        &self,
        ctx: &RequestContext,
        id: &ApplicationId,
        document_id: &DocumentId,
        remarks: Option<String>,
    ) -> Result<DocumentRecord, WorkflowError> {
        let remarks = presence(remarks);
        self.mutate(id, |record| {
            let stage = document_stage(record, document_id)?;
            require_stage_custody(ctx, record, stage, "verify documents")?;

            let now = Utc::now();
            let document = document_mut(record, document_id)?;
            document
                .verify(ctx.actor.id.clone(), remarks.clone(), now)
                .map_err(|err| WorkflowError::document("verify_document", err))?;
            let reviewed = document.clone();

            record.history.append(HistoryEntry {
                action: ActionKind::DocumentVerified,
                old_status: None,
                new_status: None,
                actor: ctx.actor.id.clone(),
                reason: remarks.clone(),
                note: Some(document_id.0.clone()),
                client: ctx.client.clone(),
                recorded_at: now,
            })?;
            Ok(reviewed)
        })
    }

    /// Reject a pending document. A reason is mandatory.
    pub fn reject_document(
        &self,
        ctx: &RequestContext,
        id: &ApplicationId,
        document_id: &DocumentId,
        remarks: String,
    ) -> Result<DocumentRecord, WorkflowError> {
        if remarks.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "document rejection requires a reason".to_string(),
            ));
        }

        self.mutate(id, |record| {
            let stage = document_stage(record, document_id)?;
            require_stage_custody(ctx, record, stage, "reject documents")?;

            let now = Utc::now();
            let document = document_mut(record, document_id)?;
            document
                .reject(ctx.actor.id.clone(), remarks.clone(), now)
                .map_err(|err| WorkflowError::document("reject_document", err))?;
            let reviewed = document.clone();

            record.history.append(HistoryEntry {
                action: ActionKind::DocumentRejected,
                old_status: None,
                new_status: None,
                actor: ctx.actor.id.clone(),
                reason: Some(remarks.clone()),
                note: Some(document_id.0.clone()),
                client: ctx.client.clone(),
                recorded_at: now,
            })?;
            Ok(reviewed)
        })
    }

    /// Replace a rejected document with a fresh upload. The record returns to
    /// pending and must be reviewed again.
    pub fn reupload_document(
        &self,
        ctx: &RequestContext,
        id: &ApplicationId,
        document_id: &DocumentId,
        file: FileMetadata,
    ) -> Result<DocumentRecord, WorkflowError> {
        self.mutate(id, |record| {
            let now = Utc::now();
            let document = document_mut(record, document_id)?;
            document
                .reupload(file.clone())
                .map_err(|err| WorkflowError::document("reupload_document", err))?;
            let replaced = document.clone();

            record.history.append(HistoryEntry {
                action: ActionKind::DocumentReuploaded,
                old_status: None,
                new_status: None,
                actor: ctx.actor.id.clone(),
                reason: None,
                note: Some(document_id.0.clone()),
                client: ctx.client.clone(),
                recorded_at: now,
            })?;
            Ok(replaced)
        })
    }

    /// Record a payment confirmation. Never changes status by itself; it only
    /// unblocks `start_initial_review`.
    pub fn confirm_payment(
        &self,
        ctx: &RequestContext,
        id: &ApplicationId,
    ) -> Result<ApplicationRecord, WorkflowError> {
        self.set_payment(ctx, id, PaymentStatus::Confirmed, ActionKind::PaymentConfirmed)
    }

    /// Roll a payment back to pending, e.g. after a bounced check.
    pub fn mark_unpaid(
        &self,
        ctx: &RequestContext,
        id: &ApplicationId,
    ) -> Result<ApplicationRecord, WorkflowError> {
        self.set_payment(ctx, id, PaymentStatus::Pending, ActionKind::PaymentMarkedUnpaid)
    }

    fn set_payment(
        &self,
        ctx: &RequestContext,
        id: &ApplicationId,
        payment: PaymentStatus,
        action: ActionKind,
    ) -> Result<ApplicationRecord, WorkflowError> {
        if ctx.actor.role == ActorRole::Applicant {
            return Err(WorkflowError::Authorization(
                "payment status can only be recorded by portal staff".to_string(),
            ));
        }

        self.mutate(id, |record| {
            record.application.payment = payment;
            record.history.append(HistoryEntry {
                action,
                old_status: None,
                new_status: None,
                actor: ctx.actor.id.clone(),
                reason: None,
                note: Some(payment.label().to_string()),
                client: ctx.client.clone(),
                recorded_at: Utc::now(),
            })?;
            Ok(record.clone())
        })
    }

    /// Assign or replace the zoning office custodian. Prior custodians
    /// survive only in the history log.
    pub fn assign_staff(
        &self,
        ctx: &RequestContext,
        id: &ApplicationId,
        staff: ActorId,
    ) -> Result<ApplicationRecord, WorkflowError> {
        self.assign(ctx, id, ReviewStage::Zoning, staff, ActionKind::StaffAssigned)
    }

    /// Assign or replace the technical office custodian. Only meaningful once
    /// the application has reached technical review.
    pub fn assign_technical_staff(
        &self,
        ctx: &RequestContext,
        id: &ApplicationId,
        staff: ActorId,
    ) -> Result<ApplicationRecord, WorkflowError> {
        self.assign(
            ctx,
            id,
            ReviewStage::Technical,
            staff,
            ActionKind::TechnicalStaffAssigned,
        )
    }

    fn assign(
        &self,
        ctx: &RequestContext,
        id: &ApplicationId,
        stage: ReviewStage,
        staff: ActorId,
        action: ActionKind,
    ) -> Result<ApplicationRecord, WorkflowError> {
        if !matches!(
            ctx.actor.role,
            ActorRole::ZoningOfficer | ActorRole::Administrator
        ) {
            return Err(WorkflowError::Authorization(format!(
                "role '{}' may not assign custody",
                ctx.actor.role.label(),
            )));
        }
        if staff.0.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "staff id must not be empty".to_string(),
            ));
        }

        self.mutate(id, |record| {
            if stage == ReviewStage::Technical
                && record.application.status != ApplicationStatus::TechnicalReview
            {
                return Err(WorkflowError::GuardNotSatisfied {
                    action: "assign_technical_staff",
                    reason: format!(
                        "application is {}, technical custody starts at technical_review",
                        record.application.status.label(),
                    ),
                });
            }

            record.application.custody.insert(stage, staff.clone());
            record.history.append(HistoryEntry {
                action,
                old_status: None,
                new_status: None,
                actor: ctx.actor.id.clone(),
                reason: None,
                note: Some(staff.0.clone()),
                client: ctx.client.clone(),
                recorded_at: Utc::now(),
            })?;
            Ok(record.clone())
        })
    }

    pub fn get(&self, id: &ApplicationId) -> Result<ApplicationRecord, WorkflowError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| WorkflowError::NotFound(format!("application {}", id.0)))
    }

    pub fn history(&self, id: &ApplicationId) -> Result<ActionHistory, WorkflowError> {
        Ok(self.get(id)?.history)
    }

    pub fn list(&self) -> Result<Vec<ApplicationRecord>, WorkflowError> {
        Ok(self.repository.list()?)
    }

    /// Run one mutating operation under the application's exclusive lock.
    /// The closure works on an in-memory copy; only a fully successful run is
    /// persisted, so guard failures leave status, custody, and history
    /// untouched.
    fn mutate<T>(
        &self,
        id: &ApplicationId,
        op: impl FnOnce(&mut ApplicationRecord) -> Result<T, WorkflowError>,
    ) -> Result<T, WorkflowError> {
        let handle = {
            let mut registry = self.locks.lock().map_err(|_| WorkflowError::Conflict)?;
            registry
                .entry(id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let held = handle.lock().map_err(|_| WorkflowError::Conflict)?;

        let mut record = self
            .repository
            .fetch(id)?
            .ok_or_else(|| WorkflowError::NotFound(format!("application {}", id.0)))?;
        let value = op(&mut record)?;
        let settled = record.application.status.is_terminal();
        self.repository.update(record)?;
        drop(held);

        // Once an application is decided its lock entry stops earning its
        // keep; evict it unless another request holds a handle right now.
        // A late write simply re-registers the lock.
        if settled {
            if let Ok(mut registry) = self.locks.lock() {
                if let Some(entry) = registry.get(id) {
                    if Arc::strong_count(entry) == 2 {
                        registry.remove(id);
                    }
                }
            }
        }
        Ok(value)
    }

    #[cfg(test)]
    pub(crate) fn tracked_locks(&self) -> usize {
        self.locks.lock().expect("lock registry poisoned").len()
    }
}

/// Drop blank remarks, keep the rest verbatim. Stored remarks must equal
/// what the caller sent, whitespace included.
fn presence(remarks: Option<String>) -> Option<String> {
    remarks.filter(|value| !value.trim().is_empty())
}

fn document_stage(
    record: &ApplicationRecord,
    document_id: &DocumentId,
) -> Result<ReviewStage, WorkflowError> {
    record
        .documents
        .iter()
        .find(|document| &document.id == document_id)
        .map(|document| document.stage)
        .ok_or_else(|| WorkflowError::NotFound(format!("document {}", document_id.0)))
}

fn document_mut<'a>(
    record: &'a mut ApplicationRecord,
    document_id: &DocumentId,
) -> Result<&'a mut DocumentRecord, WorkflowError> {
    record
        .documents
        .iter_mut()
        .find(|document| &document.id == document_id)
        .ok_or_else(|| WorkflowError::NotFound(format!("document {}", document_id.0)))
}

fn require_stage_custody(
    ctx: &RequestContext,
    record: &ApplicationRecord,
    stage: ReviewStage,
    action: &str,
) -> Result<(), WorkflowError> {
    if ctx.actor.role == ActorRole::Administrator {
        return Ok(());
    }
    match record.application.custody.get(&stage) {
        Some(custodian) if custodian == &ctx.actor.id => Ok(()),
        _ => Err(WorkflowError::Authorization(format!(
            "only the {} stage custodian may {}",
            stage.label(),
            action,
        ))),
    }
}

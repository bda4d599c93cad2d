//! Document ledger: one verification record per required document, each with
//! an independent pending/approved/rejected lifecycle. Stage completeness,
//! computed here, is the guard input for forwarding an application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ActorId, ProgramKind, ReviewStage};

/// Fixed document catalogue. Each type belongs to exactly one review stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    ProofOfOwnership,
    SitePlan,
    BarangayClearance,
    TaxDeclaration,
    BuildingPlan,
    StructuralComputation,
    EngineeringCertificate,
}

impl DocumentType {
    pub const fn stage(self) -> ReviewStage {
        match self {
            Self::ProofOfOwnership
            | Self::SitePlan
            | Self::BarangayClearance
            | Self::TaxDeclaration => ReviewStage::Zoning,
            Self::BuildingPlan | Self::StructuralComputation | Self::EngineeringCertificate => {
                ReviewStage::Technical
            }
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ProofOfOwnership => "proof_of_ownership",
            Self::SitePlan => "site_plan",
            Self::BarangayClearance => "barangay_clearance",
            Self::TaxDeclaration => "tax_declaration",
            Self::BuildingPlan => "building_plan",
            Self::StructuralComputation => "structural_computation",
            Self::EngineeringCertificate => "engineering_certificate",
        }
    }

    /// Types accepted for a given program. A submission carrying anything
    /// else is refused at intake.
    pub fn catalogue(program: ProgramKind) -> &'static [DocumentType] {
        match program {
            ProgramKind::ZoningClearance => &[
                Self::ProofOfOwnership,
                Self::SitePlan,
                Self::BarangayClearance,
                Self::TaxDeclaration,
                Self::BuildingPlan,
                Self::StructuralComputation,
                Self::EngineeringCertificate,
            ],
            ProgramKind::HousingAssistance => &[
                Self::ProofOfOwnership,
                Self::BarangayClearance,
                Self::TaxDeclaration,
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

/// Stable reference handed back by the file store; the core never inspects
/// file contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub file_name: String,
    pub storage_key: String,
}

/// Lifecycle errors raised by record-level operations.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document is {current}, only pending documents can be reviewed")]
    NotAwaitingReview { current: &'static str },
    #[error("document is {current}, only rejected documents can be re-uploaded")]
    NotRejected { current: &'static str },
}

/// One verification record in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub document_type: DocumentType,
    pub stage: ReviewStage,
    pub verification: VerificationStatus,
    pub file: FileMetadata,
    pub reviewed_by: Option<ActorId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub remarks: Option<String>,
}

impl DocumentRecord {
    pub fn new(id: DocumentId, document_type: DocumentType, file: FileMetadata) -> Self {
        Self {
            id,
            document_type,
            stage: document_type.stage(),
            verification: VerificationStatus::Pending,
            file,
            reviewed_by: None,
            reviewed_at: None,
            remarks: None,
        }
    }

    /// Mark the document approved. Re-verifying a reviewed document is an
    /// error, not a silent no-op.
    pub fn verify(
        &mut self,
        reviewer: ActorId,
        remarks: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), DocumentError> {
        self.require_pending()?;
        self.verification = VerificationStatus::Approved;
        self.reviewed_by = Some(reviewer);
        self.reviewed_at = Some(at);
        self.remarks = remarks;
        Ok(())
    }

    pub fn reject(
        &mut self,
        reviewer: ActorId,
        remarks: String,
        at: DateTime<Utc>,
    ) -> Result<(), DocumentError> {
        self.require_pending()?;
        self.verification = VerificationStatus::Rejected;
        self.reviewed_by = Some(reviewer);
        self.reviewed_at = Some(at);
        self.remarks = Some(remarks);
        Ok(())
    }

    /// Replace the file after a rejection. New content is never
    /// auto-approved: the record drops back to pending with the prior review
    /// cleared.
    pub fn reupload(&mut self, file: FileMetadata) -> Result<(), DocumentError> {
        if self.verification != VerificationStatus::Rejected {
            return Err(DocumentError::NotRejected {
                current: self.verification.label(),
            });
        }
        self.file = file;
        self.verification = VerificationStatus::Pending;
        self.reviewed_by = None;
        self.reviewed_at = None;
        self.remarks = None;
        Ok(())
    }

    fn require_pending(&self) -> Result<(), DocumentError> {
        if self.verification != VerificationStatus::Pending {
            return Err(DocumentError::NotAwaitingReview {
                current: self.verification.label(),
            });
        }
        Ok(())
    }
}

/// True iff the stage has at least one record and every record of the stage
/// is approved. A stage with zero documents is never complete, so an
/// application cannot slip past a stage nothing was uploaded for.
pub fn stage_complete(records: &[DocumentRecord], stage: ReviewStage) -> bool {
    let mut seen = false;
    for record in records.iter().filter(|record| record.stage == stage) {
        if record.verification != VerificationStatus::Approved {
            return false;
        }
        seen = true;
    }
    seen
}

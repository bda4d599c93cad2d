use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::documents::{DocumentType, FileMetadata};

/// Human-readable application number, e.g. `ZC-000014`. Assigned once at
/// submission from a per-program sequence and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    pub fn new(program: ProgramKind, sequence: u64) -> Self {
        Self(format!("{}-{:06}", program.prefix(), sequence))
    }
}

/// Programs served by the portal. The prefix seeds the application number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramKind {
    ZoningClearance,
    HousingAssistance,
}

impl ProgramKind {
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::ZoningClearance => "ZC",
            Self::HousingAssistance => "HA",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ZoningClearance => "zoning_clearance",
            Self::HousingAssistance => "housing_assistance",
        }
    }
}

/// Lifecycle status of an application. Transitions happen only through the
/// edges defined in [`super::transitions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    InitialReview,
    TechnicalReview,
    AwaitingApproval,
    Approved,
    Rejected,
    RequiresChanges,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InitialReview => "initial_review",
            Self::TechnicalReview => "technical_review",
            Self::AwaitingApproval => "awaiting_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::RequiresChanges => "requires_changes",
        }
    }

    /// True once no edge leaves the status. `requires_changes` is terminal
    /// for this application: the applicant addresses the remarks with a
    /// fresh submission, which opens a new application under a new number.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::RequiresChanges)
    }
}

/// Payment gates entry into initial review but is otherwise independent of
/// the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Confirmed,
}

impl PaymentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
        }
    }
}

/// The two offices an application passes through. Doubles as the document
/// category and as the custody key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStage {
    Zoning,
    Technical,
}

impl ReviewStage {
    pub const fn ordered() -> [Self; 2] {
        [Self::Zoning, Self::Technical]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Zoning => "zoning",
            Self::Technical => "technical",
        }
    }
}

/// Identifier resolved by the identity provider for any acting party.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Applicant,
    ZoningOfficer,
    TechnicalReviewer,
    Administrator,
}

impl ActorRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Applicant => "applicant",
            Self::ZoningOfficer => "zoning_officer",
            Self::TechnicalReviewer => "technical_reviewer",
            Self::Administrator => "administrator",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "applicant" => Some(Self::Applicant),
            "zoning_officer" => Some(Self::ZoningOfficer),
            "technical_reviewer" => Some(Self::TechnicalReviewer),
            "administrator" => Some(Self::Administrator),
            _ => None,
        }
    }
}

/// Authenticated actor as handed over by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub role: ActorRole,
}

/// Request-scoped client metadata captured into every history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMeta {
    pub ip: String,
    pub user_agent: String,
}

/// Explicit per-call context. Core operations never read ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub actor: Actor,
    pub client: ClientMeta,
}

/// Applicant identity and project attributes. Opaque to the state machine,
/// which only ever reads status, payment, and document state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantProfile {
    pub full_name: String,
    pub contact_number: String,
    pub email: String,
    pub barangay: String,
    pub project_description: String,
    pub project_location: String,
    pub land_area_sqm: f64,
}

/// Stage-entry timestamps, each nullable until the stage is reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTimestamps {
    pub submitted_at: DateTime<Utc>,
    pub initial_review_started_at: Option<DateTime<Utc>>,
    pub forwarded_to_technical_at: Option<DateTime<Utc>>,
    pub returned_to_zoning_at: Option<DateTime<Utc>>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl StageTimestamps {
    pub fn at_submission(submitted_at: DateTime<Utc>) -> Self {
        Self {
            submitted_at,
            initial_review_started_at: None,
            forwarded_to_technical_at: None,
            returned_to_zoning_at: None,
            decided_at: None,
        }
    }
}

/// The application aggregate root. Custody is a single explicit map keyed by
/// stage, so it can never disagree with a second set of nullable columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub program: ProgramKind,
    pub status: ApplicationStatus,
    pub payment: PaymentStatus,
    pub custody: BTreeMap<ReviewStage, ActorId>,
    pub timestamps: StageTimestamps,
    pub applicant: ApplicantProfile,
}

/// One uploaded file as delivered by the file store collaborator: the core
/// only ever sees the stable storage key, never the bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUpload {
    pub document_type: DocumentType,
    pub file: FileMetadata,
}

/// Citizen-facing submission payload for a zoning clearance application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoningSubmission {
    pub applicant: ApplicantProfile,
    pub documents: Vec<DocumentUpload>,
}

use serde::{Deserialize, Serialize};

use super::documents::DocumentRecord;
use super::domain::{Application, ApplicationId};
use super::history::ActionHistory;

/// The whole aggregate persisted as one unit: application state, document
/// ledger, and action history. A single `update` therefore commits a status
/// change together with its history entry, or neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub application: Application,
    pub documents: Vec<DocumentRecord>,
    pub history: ActionHistory,
}

impl ApplicationRecord {
    /// API projection: application plus nested documents, history elided.
    pub fn view(&self) -> ApplicationView {
        ApplicationView {
            application: self.application.clone(),
            documents: self.documents.clone(),
        }
    }
}

/// Response shape for `GET /applications/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    #[serde(flatten)]
    pub application: Application,
    pub documents: Vec<DocumentRecord>,
}

/// Storage abstraction so the workflow service can be exercised in isolation.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError>;
    fn update(&self, record: ApplicationRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn list(&self) -> Result<Vec<ApplicationRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

//! Eligibility scoring and fee computation for the housing assistance
//! program. Pure functions over an application profile and a configuration
//! snapshot: no side effects, no history entries, replayable for audit.

pub mod config;
pub mod fees;
pub mod router;
pub mod scoring;

pub use config::{BonusPoints, EligibilityConfig, EligibilityConfigError, FactorWeights, FeeRow};
pub use fees::{compute_fee, FeeBreakdown, HousingProgramType};
pub use router::housing_router;
pub use scoring::{score, EligibilityFactor, HouseholdProfile, HousingCondition, ScoreBreakdown};

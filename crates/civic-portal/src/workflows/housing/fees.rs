use serde::{Deserialize, Serialize};

use super::config::EligibilityConfig;

/// Housing assistance program variants, each with its own fee row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HousingProgramType {
    LotAcquisition,
    HousingUnit,
    RentalSubsidy,
}

impl HousingProgramType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::LotAcquisition => "lot_acquisition",
            Self::HousingUnit => "housing_unit",
            Self::RentalSubsidy => "rental_subsidy",
        }
    }
}

/// Fee assessment: base scales with requested units, processing is flat, and
/// the total is exactly their sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub base: f64,
    pub processing: f64,
    pub total: f64,
}

/// Deterministic fee computation for a program type and unit count.
pub fn compute_fee(
    program: HousingProgramType,
    requested_units: u32,
    config: &EligibilityConfig,
) -> FeeBreakdown {
    let row = config.fee_row_for(program);
    let base = row.base_per_unit * f64::from(requested_units);
    let processing = row.processing;
    FeeBreakdown {
        base,
        processing,
        total: base + processing,
    }
}

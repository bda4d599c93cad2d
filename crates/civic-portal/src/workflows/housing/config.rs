use serde::{Deserialize, Serialize};

use crate::config::settings::{SettingsError, SettingsStore};

use super::fees::HousingProgramType;

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Weights applied to the five eligibility factors. Must sum to 1.0; checked
/// when the configuration is loaded, never at score time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorWeights {
    pub income: f64,
    pub household_size: f64,
    pub vulnerability: f64,
    pub residency: f64,
    pub housing_condition: f64,
}

impl FactorWeights {
    pub fn sum(&self) -> f64 {
        self.income + self.household_size + self.vulnerability + self.residency
            + self.housing_condition
    }
}

/// Additive points granted after the weighted sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BonusPoints {
    pub senior: f64,
    pub pwd: f64,
    pub solo_parent: f64,
    pub ofw: f64,
}

/// Fee parameters for one housing program type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeRow {
    pub base_per_unit: f64,
    pub processing: f64,
}

/// Snapshot of everything the calculator reads from the settings store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityConfig {
    pub weights: FactorWeights,
    pub bonus: BonusPoints,
    /// Monthly income at or above which the income factor scores zero.
    pub income_ceiling: f64,
    /// Optional ceiling on the final score. Left unset, bonus points may push
    /// the total past 100; whether that is intended is a question for the
    /// program owners, so it stays configurable instead of hardcoded.
    pub score_cap: Option<f64>,
    pub lot_acquisition: FeeRow,
    pub housing_unit: FeeRow,
    pub rental_subsidy: FeeRow,
}

#[derive(Debug, thiserror::Error)]
pub enum EligibilityConfigError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("eligibility weights must sum to 1.0, got {sum}")]
    WeightSum { sum: f64 },
    #[error("income ceiling must be positive, got {0}")]
    NonPositiveCeiling(f64),
}

impl EligibilityConfig {
    /// Load and validate the calculator configuration from the settings
    /// store.
    pub fn from_settings(store: &dyn SettingsStore) -> Result<Self, EligibilityConfigError> {
        let weights = FactorWeights {
            income: store.number("eligibility.weight.income")?,
            household_size: store.number("eligibility.weight.household_size")?,
            vulnerability: store.number("eligibility.weight.vulnerability")?,
            residency: store.number("eligibility.weight.residency")?,
            housing_condition: store.number("eligibility.weight.housing_condition")?,
        };
        let sum = weights.sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(EligibilityConfigError::WeightSum { sum });
        }

        let income_ceiling = store.number("eligibility.income_ceiling")?;
        if income_ceiling <= 0.0 {
            return Err(EligibilityConfigError::NonPositiveCeiling(income_ceiling));
        }

        Ok(Self {
            weights,
            bonus: BonusPoints {
                senior: store.number("eligibility.bonus.senior")?,
                pwd: store.number("eligibility.bonus.pwd")?,
                solo_parent: store.number("eligibility.bonus.solo_parent")?,
                ofw: store.number("eligibility.bonus.ofw")?,
            },
            income_ceiling,
            score_cap: store.optional_number("eligibility.score_cap")?,
            lot_acquisition: Self::fee_row(store, "lot_acquisition")?,
            housing_unit: Self::fee_row(store, "housing_unit")?,
            rental_subsidy: Self::fee_row(store, "rental_subsidy")?,
        })
    }

    fn fee_row(store: &dyn SettingsStore, program: &str) -> Result<FeeRow, EligibilityConfigError> {
        Ok(FeeRow {
            base_per_unit: store.number(&format!("fees.housing.{program}.base_per_unit"))?,
            processing: store.number(&format!("fees.housing.{program}.processing"))?,
        })
    }

    pub fn fee_row_for(&self, program: HousingProgramType) -> &FeeRow {
        match program {
            HousingProgramType::LotAcquisition => &self.lot_acquisition,
            HousingProgramType::HousingUnit => &self.housing_unit,
            HousingProgramType::RentalSubsidy => &self.rental_subsidy,
        }
    }
}

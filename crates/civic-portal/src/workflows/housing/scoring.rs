use serde::{Deserialize, Serialize};

use super::config::EligibilityConfig;

/// The factors admitted into the eligibility rubric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityFactor {
    Income,
    HouseholdSize,
    Vulnerability,
    Residency,
    HousingCondition,
}

/// Current dwelling situation, ranked from most to least precarious.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HousingCondition {
    InformalSettlement,
    Dilapidated,
    SharedDwelling,
    Renting,
    Owned,
}

impl HousingCondition {
    /// Raw factor score on the 0-100 scale.
    const fn raw_score(self) -> f64 {
        match self {
            Self::InformalSettlement => 100.0,
            Self::Dilapidated => 85.0,
            Self::SharedDwelling => 60.0,
            Self::Renting => 40.0,
            Self::Owned => 0.0,
        }
    }
}

/// Household attributes the calculator consumes. Collected at intake and
/// frozen alongside the configuration snapshot so scores can be replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdProfile {
    pub monthly_income: f64,
    pub household_size: u8,
    pub years_of_residency: u8,
    pub housing_condition: HousingCondition,
    pub displaced_by_project: bool,
    pub disaster_victim: bool,
    pub has_senior_member: bool,
    pub has_pwd_member: bool,
    pub solo_parent: bool,
    pub ofw_household: bool,
}

/// One factor's contribution, kept for the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: EligibilityFactor,
    pub raw: f64,
    pub weighted: f64,
    pub notes: String,
}

/// Composite score with its full derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub components: Vec<ScoreComponent>,
    pub weighted_total: f64,
    pub bonus_points: f64,
    pub total: f64,
}

/// Compute the composite eligibility score. Pure function of the profile and
/// the configuration snapshot: same inputs, same output.
pub fn score(profile: &HouseholdProfile, config: &EligibilityConfig) -> ScoreBreakdown {
    let mut components = Vec::with_capacity(5);

    let income_raw = ((config.income_ceiling - profile.monthly_income) / config.income_ceiling
        * 100.0)
        .clamp(0.0, 100.0);
    components.push(ScoreComponent {
        factor: EligibilityFactor::Income,
        raw: income_raw,
        weighted: income_raw * config.weights.income,
        notes: format!(
            "monthly income {:.2} against ceiling {:.2}",
            profile.monthly_income, config.income_ceiling
        ),
    });

    let size_raw = (f64::from(profile.household_size.min(10)) / 10.0) * 100.0;
    components.push(ScoreComponent {
        factor: EligibilityFactor::HouseholdSize,
        raw: size_raw,
        weighted: size_raw * config.weights.household_size,
        notes: format!("household of {}", profile.household_size),
    });

    let mut vulnerability_raw: f64 = 0.0;
    if profile.displaced_by_project {
        vulnerability_raw += 50.0;
    }
    if profile.disaster_victim {
        vulnerability_raw += 50.0;
    }
    components.push(ScoreComponent {
        factor: EligibilityFactor::Vulnerability,
        raw: vulnerability_raw,
        weighted: vulnerability_raw * config.weights.vulnerability,
        notes: format!(
            "displaced: {}, disaster victim: {}",
            profile.displaced_by_project, profile.disaster_victim
        ),
    });

    let residency_raw = (f64::from(profile.years_of_residency.min(20)) / 20.0) * 100.0;
    components.push(ScoreComponent {
        factor: EligibilityFactor::Residency,
        raw: residency_raw,
        weighted: residency_raw * config.weights.residency,
        notes: format!("{} year(s) of residency", profile.years_of_residency),
    });

    let condition_raw = profile.housing_condition.raw_score();
    components.push(ScoreComponent {
        factor: EligibilityFactor::HousingCondition,
        raw: condition_raw,
        weighted: condition_raw * config.weights.housing_condition,
        notes: format!("current dwelling: {:?}", profile.housing_condition),
    });

    let weighted_total: f64 = components.iter().map(|component| component.weighted).sum();

    let mut bonus_points = 0.0;
    if profile.has_senior_member {
        bonus_points += config.bonus.senior;
    }
    if profile.has_pwd_member {
        bonus_points += config.bonus.pwd;
    }
    if profile.solo_parent {
        bonus_points += config.bonus.solo_parent;
    }
    if profile.ofw_household {
        bonus_points += config.bonus.ofw;
    }

    let uncapped = weighted_total + bonus_points;
    let total = match config.score_cap {
        Some(cap) => uncapped.min(cap),
        None => uncapped,
    };

    ScoreBreakdown {
        components,
        weighted_total,
        bonus_points,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::InMemorySettings;

    fn config() -> EligibilityConfig {
        let store = InMemorySettings::default();
        crate::workflows::housing::config::tests::seed_store(&store);
        EligibilityConfig::from_settings(&store).expect("config loads")
    }

    fn profile() -> HouseholdProfile {
        HouseholdProfile {
            monthly_income: 12000.0,
            household_size: 5,
            years_of_residency: 8,
            housing_condition: HousingCondition::Renting,
            displaced_by_project: true,
            disaster_victim: false,
            has_senior_member: true,
            has_pwd_member: false,
            solo_parent: true,
            ofw_household: false,
        }
    }

    #[test]
    fn score_is_deterministic() {
        let config = config();
        let profile = profile();
        let first = score(&profile, &config);
        let second = score(&profile, &config);
        assert_eq!(first, second);
    }

    #[test]
    fn bonus_points_are_additive_after_the_weighted_sum() {
        let config = config();
        let breakdown = score(&profile(), &config);

        // senior 5.0 + solo parent 3.0
        assert!((breakdown.bonus_points - 8.0).abs() < 1e-9);
        assert!((breakdown.total - (breakdown.weighted_total + 8.0)).abs() < 1e-9);
        assert_eq!(breakdown.components.len(), 5);
    }

    #[test]
    fn configured_cap_limits_the_total() {
        let store = InMemorySettings::default();
        crate::workflows::housing::config::tests::seed_store(&store);
        store.put_number("eligibility.score_cap", 50.0);
        let config = EligibilityConfig::from_settings(&store).expect("config loads");

        let breakdown = score(&profile(), &config);
        assert!(breakdown.total <= 50.0);
    }

    #[test]
    fn income_factor_floors_at_zero_above_the_ceiling() {
        let config = config();
        let mut wealthy = profile();
        wealthy.monthly_income = 90000.0;

        let breakdown = score(&wealthy, &config);
        let income = breakdown
            .components
            .iter()
            .find(|component| component.factor == EligibilityFactor::Income)
            .expect("income component present");
        assert_eq!(income.raw, 0.0);
    }
}

use civic_portal::config::settings::{InMemorySettings, SettingValue, Visibility};
use civic_portal::workflows::zoning::{
    ApplicationId, ApplicationRecord, ApplicationRepository, RepositoryError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl ApplicationRepository for InMemoryApplicationRepository {
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
        let mut records: Vec<_> = guard.values().cloned().collect();
        records.sort_by(|a, b| a.application.id.cmp(&b.application.id));
        Ok(records)
    }
}

/// Administrator-tunable defaults for the housing assistance calculator.
/// A deployment would load these from the settings database; the defaults
/// here match the municipal ordinance schedule.
pub(crate) fn default_settings() -> InMemorySettings {
    let store = InMemorySettings::default();

    store.put_number("eligibility.weight.income", 0.30);
    store.put_number("eligibility.weight.household_size", 0.20);
    store.put_number("eligibility.weight.vulnerability", 0.20);
    store.put_number("eligibility.weight.residency", 0.15);
    store.put_number("eligibility.weight.housing_condition", 0.15);
    store.put_number("eligibility.income_ceiling", 30_000.0);
    store.put_number("eligibility.bonus.senior", 5.0);
    store.put_number("eligibility.bonus.pwd", 5.0);
    store.put_number("eligibility.bonus.solo_parent", 3.0);
    store.put_number("eligibility.bonus.ofw", 2.0);
    store.put_number("eligibility.score_cap", 100.0);

    // The fee schedule is published on the citizen portal; the scoring
    // weights stay internal.
    for (key, amount) in [
        ("fees.housing.lot_acquisition.base_per_unit", 2_500.0),
        ("fees.housing.lot_acquisition.processing", 500.0),
        ("fees.housing.housing_unit.base_per_unit", 1_500.0),
        ("fees.housing.housing_unit.processing", 300.0),
        ("fees.housing.rental_subsidy.base_per_unit", 800.0),
        ("fees.housing.rental_subsidy.processing", 150.0),
    ] {
        store.put(key, SettingValue::Number(amount), Visibility::Public);
    }

    store
}

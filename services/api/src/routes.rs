use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use civic_portal::config::settings::InMemorySettings;
use civic_portal::workflows::housing::{housing_router, EligibilityConfig};
use civic_portal::workflows::zoning::{
    zoning_router, ApplicationRepository, ZoningWorkflowService,
};
use serde_json::json;
use std::sync::Arc;

/// Compose the portal surface: the zoning review workflow, the housing
/// assistance calculator, and the operational endpoints.
pub(crate) fn portal_routes<R>(
    zoning: Arc<ZoningWorkflowService<R>>,
    eligibility: Arc<EligibilityConfig>,
    settings: InMemorySettings,
) -> axum::Router
where
    R: ApplicationRepository + 'static,
{
    zoning_router(zoning)
        .merge(housing_router(eligibility))
        .route(
            "/api/v1/settings",
            axum::routing::get(move || public_settings(settings.clone())),
        )
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

/// Citizen-facing configuration. Private entries never leave the service.
async fn public_settings(settings: InMemorySettings) -> Json<serde_json::Value> {
    Json(json!({ "settings": settings.public_entries() }))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{default_settings, AppState, InMemoryApplicationRepository};
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn test_router(ready: bool) -> axum::Router {
        let repository = Arc::new(InMemoryApplicationRepository::default());
        let zoning = Arc::new(ZoningWorkflowService::new(repository));
        let settings = default_settings();
        let eligibility = Arc::new(
            EligibilityConfig::from_settings(&settings).expect("defaults are consistent"),
        );
        let handle = PrometheusBuilder::new()
            .build_recorder()
            .handle();
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(handle),
        };
        portal_routes(zoning, eligibility, settings).layer(Extension(state))
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let response = test_router(true)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .expect("health executes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn readiness_gates_on_the_startup_flag() {
        let response = test_router(false)
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .expect("ready executes");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = test_router(true)
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .expect("ready executes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn public_settings_expose_only_the_fee_schedule() {
        let response = test_router(true)
            .oneshot(
                Request::get("/api/v1/settings")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("settings executes");
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        let value: serde_json::Value = serde_json::from_slice(&body).expect("json payload");
        let entries = value["settings"].as_array().expect("settings array");
        assert_eq!(entries.len(), 6);
        assert!(entries
            .iter()
            .all(|entry| entry["key"].as_str().unwrap().starts_with("fees.housing.")));
    }

    #[tokio::test]
    async fn score_endpoint_is_mounted() {
        let body = serde_json::json!({
            "profile": {
                "monthly_income": 12000.0,
                "household_size": 5,
                "years_of_residency": 10,
                "housing_condition": "informal_settlement",
                "displaced_by_project": false,
                "disaster_victim": false,
                "has_senior_member": true,
                "has_pwd_member": false,
                "solo_parent": false,
                "ofw_household": false
            },
            "program_type": "housing_unit",
            "requested_units": 1
        });
        let request = Request::post("/api/v1/housing/score")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = test_router(true)
            .oneshot(request)
            .await
            .expect("score executes");
        assert_eq!(response.status(), StatusCode::OK);
    }
}

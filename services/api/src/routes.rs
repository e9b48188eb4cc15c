use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use quickcash::backend::{ApplicationStore, AuthProvider};
use quickcash::workflows::funnel_router;
use quickcash::workflows::status::SessionStatusResolver;
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_funnel_routes<A, S>(resolver: Arc<SessionStatusResolver<A, S>>) -> axum::Router
where
    A: AuthProvider + 'static,
    S: ApplicationStore + 'static,
{
    funnel_router(resolver)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
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
    use crate::infra::demo_backend;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use quickcash::session::SessionContext;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn app(ready: bool, with_application: bool) -> axum::Router {
        let backend = demo_backend(with_application);
        let resolver = Arc::new(SessionStatusResolver::new(
            backend.clone(),
            backend,
            SessionContext::anonymous(),
        ));
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        with_funnel_routes(resolver).layer(Extension(state))
    }

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        let status = response.status();
        let body = to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        (status, serde_json::from_slice(&body).expect("json body"))
    }

    #[tokio::test]
    async fn readiness_tracks_the_flag() {
        let (status, payload) = get(app(false, false), "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload["status"], "initializing");

        let (status, _) = get(app(true, false), "/ready").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn health_is_always_ok() {
        let (status, payload) = get(app(false, false), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["status"], "ok");
    }

    #[tokio::test]
    async fn seeded_applicant_is_routed_to_status() {
        let (_, payload) = get(app(true, true), "/api/v1/funnel/route").await;
        assert_eq!(payload["route"], "/status");

        let (status, view) = get(app(true, true), "/api/v1/loan/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["next_action"], "complete_kyc");
    }

    #[tokio::test]
    async fn metrics_render_as_text() {
        let response = app(true, false)
            .oneshot(Request::get("/metrics").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }
}

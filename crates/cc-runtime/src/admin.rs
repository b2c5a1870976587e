//! Operator surface (§6): "the only externally initiated operation on the
//! core is start/stop of the cycle driver and reload of configuration."
//! Everything else observable from outside happens indirectly, through
//! Store writes made by channel adapters.

use crate::cycle::CycleHandle;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
struct AdminState {
    cycle: Arc<CycleHandle>,
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    running: bool,
    version: &'static str,
    degraded: bool,
    degraded_reasons: Vec<String>,
}

#[derive(Serialize)]
struct AckBody {
    ok: bool,
}

async fn healthz(State(state): State<AdminState>) -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok",
        running: state.cycle.is_running(),
        version: cc_core::VERSION,
        degraded: state.cycle.is_degraded(),
        degraded_reasons: state.cycle.degraded_reasons(),
    })
}

async fn stop(State(state): State<AdminState>) -> Json<AckBody> {
    state.cycle.request_stop();
    Json(AckBody { ok: true })
}

async fn reload(State(state): State<AdminState>) -> Json<AckBody> {
    let ok = state.cycle.request_reload();
    Json(AckBody { ok })
}

pub fn router(cycle: Arc<CycleHandle>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/admin/stop", post(stop))
        .route("/admin/reload", post(reload))
        .layer(CorsLayer::permissive())
        .with_state(AdminState { cycle })
}

pub async fn serve(cycle: Arc<CycleHandle>, port: u16) -> std::io::Result<()> {
    let app = router(cycle);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "admin surface listening");
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::CycleHandle;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn healthz_reports_running_state() {
        let cycle = Arc::new(CycleHandle::new());
        let app = router(cycle);
        let response = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }

    #[tokio::test]
    async fn stop_sets_the_stop_flag() {
        let cycle = Arc::new(CycleHandle::new());
        let app = router(cycle.clone());
        let _ = app
            .oneshot(Request::builder().method("POST").uri("/admin/stop").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(cycle.stop_requested());
    }
}

//! Health probe.

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::core::ServerState;
use crate::utils::{ok, AppResponse};

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthInfo {
    pub status: &'static str,
    pub version: &'static str,
}

async fn health() -> Json<AppResponse<HealthInfo>> {
    ok(HealthInfo {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

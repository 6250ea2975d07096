//! Tenant broadcast endpoint (administrator-initiated).

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use validator::Validate;

use shared::message::{Severity, TenantBroadcastPayload};

use crate::auth::policy::{self, Capability};
use crate::auth::CurrentActor;
use crate::core::ServerState;
use crate::utils::{ok, AppResponse, AppResult};

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/broadcast", post(broadcast))
}

#[derive(Debug, Deserialize, Validate)]
pub struct BroadcastDto {
    #[validate(length(min = 1))]
    pub title: String,
    pub body: String,
    pub severity: Severity,
    /// When set, scope delivery to these store rooms instead of the whole tenant
    pub store_ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct BroadcastResult {
    pub delivered: usize,
}

async fn broadcast(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Json(dto): Json<BroadcastDto>,
) -> AppResult<Json<AppResponse<BroadcastResult>>> {
    dto.validate()?;
    policy::require(actor.role, Capability::TenantBroadcast)?;

    let payload = TenantBroadcastPayload::new(dto.title, dto.body, dto.severity);
    let delivered = state.notifier.broadcast_to_tenant(
        &actor.tenant_id,
        &payload,
        dto.store_ids.as_deref(),
    );
    Ok(ok(BroadcastResult { delivered }))
}

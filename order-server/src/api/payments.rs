//! Payment gateway signal ingress.
//!
//! The gateway informs this core only through confirmed/failed/refunded
//! signals keyed by order id; the core never initiates gateway calls.
//! Gateway authentication happens at the upstream edge, not here.

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use shared::order::{Order, PaymentSignal};

use crate::core::ServerState;
use crate::utils::{ok, AppResponse, AppResult};

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/payments/signal", post(apply_signal))
}

#[derive(Debug, Deserialize)]
pub struct PaymentSignalDto {
    pub order_id: Uuid,
    pub signal: PaymentSignal,
}

async fn apply_signal(
    State(state): State<ServerState>,
    Json(dto): Json<PaymentSignalDto>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state
        .orders
        .apply_payment_signal(dto.order_id, dto.signal)
        .await?;
    Ok(ok(order))
}

//! Order API handlers.
//!
//! Creation and status transitions are the only mutations; the GET routes
//! are the pull-based source of truth backing the push notifications.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use shared::order::{Order, OrderKind, OrderStatus, StatusHistoryEntry};

use crate::auth::CurrentActor;
use crate::core::ServerState;
use crate::orders::CreateOrderInput;
use crate::pricing::{AddonInput, LineItemInput};
use crate::utils::{ok, AppResponse, AppResult};

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/orders", post(create))
        .route("/api/orders/active", get(list_active))
        .route("/api/orders/{id}", get(get_by_id))
        .route("/api/orders/{id}/history", get(get_history))
        .route("/api/orders/{id}/status", post(transition_status))
}

// ========== DTOs ==========

#[derive(Debug, Deserialize, Serialize)]
pub struct AddonDto {
    pub addon_id: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct LineItemDto {
    #[validate(length(min = 1))]
    pub product_id: String,
    pub variant_id: Option<String>,
    #[validate(range(min = 1))]
    pub quantity: u32,
    #[serde(default)]
    pub addons: Vec<AddonDto>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderDto {
    #[validate(length(min = 1))]
    pub store_id: String,
    #[serde(default)]
    pub kind: OrderKind,
    #[validate(length(min = 1), nested)]
    pub items: Vec<LineItemDto>,
    pub coupon_code: Option<String>,
    pub table_no: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransitionDto {
    pub status: OrderStatus,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ActiveQuery {
    pub store_id: String,
}

impl From<LineItemDto> for LineItemInput {
    fn from(dto: LineItemDto) -> Self {
        LineItemInput {
            product_id: dto.product_id,
            variant_id: dto.variant_id,
            quantity: dto.quantity,
            addons: dto
                .addons
                .into_iter()
                .map(|a| AddonInput {
                    addon_id: a.addon_id,
                    quantity: a.quantity,
                })
                .collect(),
            note: dto.note,
        }
    }
}

// ========== Handlers ==========

/// Create an order
async fn create(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Json(dto): Json<CreateOrderDto>,
) -> AppResult<Json<AppResponse<Order>>> {
    dto.validate()?;
    let input = CreateOrderInput {
        store_id: dto.store_id,
        kind: dto.kind,
        items: dto.items.into_iter().map(Into::into).collect(),
        coupon_code: dto.coupon_code,
        table_no: dto.table_no,
        note: dto.note,
    };
    let order = state.orders.create_order(&actor, input).await?;
    Ok(ok(order))
}

/// Get order by id
async fn get_by_id(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state.orders.get_order(&actor, id).await?;
    Ok(ok(order))
}

/// Full status history (the pull-based source of truth)
async fn get_history(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AppResponse<Vec<StatusHistoryEntry>>>> {
    let history = state.orders.get_history(&actor, id).await?;
    Ok(ok(history))
}

/// Request a status transition
async fn transition_status(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    Json(dto): Json<TransitionDto>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state
        .orders
        .transition(&actor, id, dto.status, dto.note)
        .await?;
    Ok(ok(order))
}

/// Non-terminal orders for one store (staff board)
async fn list_active(
    State(state): State<ServerState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<ActiveQuery>,
) -> AppResult<Json<AppResponse<Vec<Order>>>> {
    let orders = state
        .orders
        .list_active_for_store(&actor, &query.store_id)
        .await?;
    Ok(ok(orders))
}

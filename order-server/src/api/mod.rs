//! Thin HTTP surface.
//!
//! Parses requests and serializes responses — nothing else. All invariants
//! live in the engine; every mutation returns either a typed success value
//! or one of the rejection kinds, and every push notification published by
//! the engine has its pull-based equivalent here.

pub mod broadcast;
pub mod health;
pub mod orders;
pub mod payments;

use axum::Router;

use crate::core::ServerState;

/// Full API router
pub fn router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(payments::router())
        .merge(broadcast::router())
}

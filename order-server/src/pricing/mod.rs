//! Pricing & Validation Engine.
//!
//! Turns a raw item list + optional coupon code into a priced, validated
//! order draft (or a typed rejection). Pure computation over inputs plus one
//! read of catalog state — no writes; the coupon usage increment belongs to
//! the order service, transactionally tied to order creation.

pub mod engine;
pub mod money;

pub use engine::{AddonInput, LineItemInput, PricedOrder, PricingEngine};

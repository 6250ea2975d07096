//! Order domain types: the order itself, its line items, the status state
//! machine, the append-only status history, and the rejection taxonomy.

mod rejection;
mod status;
mod types;

pub use rejection::{Rejection, RejectionCode};
pub use status::OrderStatus;
pub use types::{
    AddonSelection, Order, OrderItem, OrderKind, PaymentSignal, PaymentStatus, StatusHistoryEntry,
};

//! 共享类型库 - order-server 与客户端之间的公共类型
//!
//! 这些类型在服务端和所有客户端（POS 前台、厨房显示、顾客端）之间共享，
//! 用于进程内通信和 HTTP/实时消息的序列化。
//!
//! # 模块结构
//!
//! ```text
//! shared/src/
//! ├── types.rs       # 身份类型（角色、操作者）
//! ├── catalog.rs     # 商品目录快照类型
//! ├── coupon.rs      # 优惠券模型
//! ├── order/         # 订单、状态机、拒绝码
//! └── message/       # 实时通知信封与各受众载荷
//! ```

pub mod catalog;
pub mod coupon;
pub mod message;
pub mod order;
pub mod types;

pub use catalog::{AddonSnapshot, ProductSnapshot, VariantSnapshot};
pub use coupon::{Coupon, DiscountRule};
pub use message::{Envelope, EventKind, Room, Severity};
pub use order::{
    Order, OrderItem, OrderKind, OrderStatus, PaymentSignal, PaymentStatus, Rejection,
    RejectionCode, StatusHistoryEntry,
};
pub use types::{Actor, Role};

//! Notification Router — room membership and shaped fan-out.
//!
//! 构造一次、按引用注入：hub 在进程内唯一，任何需要发事件的组件
//! 持有它的 Arc，没有隐藏的全局广播对象。

mod hub;
mod notifier;

pub use hub::{ClientSession, ConnectionHandle, NotificationHub};
pub use notifier::Notifier;

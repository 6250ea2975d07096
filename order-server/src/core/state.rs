use std::sync::Arc;
use std::time::Duration;

use crate::catalog::InMemoryCatalog;
use crate::core::Config;
use crate::coupons::CouponStore;
use crate::directory::InMemoryStoreDirectory;
use crate::loyalty::{CompletionProcessor, InMemoryLedger};
use crate::notify::{NotificationHub, Notifier};
use crate::orders::{InMemoryOrderStore, OrderService, OrderServiceConfig};
use crate::pricing::PricingEngine;
use crate::printing::{LogDispatcher, PrintService, RendererBackend};

/// 服务器状态 - 持有所有服务的单例引用
///
/// ServerState 是进程的核心数据结构，持有所有服务的共享引用。
/// 使用 Arc 实现浅拷贝，所有权成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | catalog | Arc<InMemoryCatalog> | 目录快照访问器（进程内实现） |
/// | directory | Arc<InMemoryStoreDirectory> | 门店归属目录 |
/// | coupons | Arc<CouponStore> | 优惠券与用量计数 |
/// | ledger | Arc<InMemoryLedger> | 会员账本（进程内实现） |
/// | hub | Arc<NotificationHub> | 房间广播 hub（每进程一个） |
/// | notifier | Arc<Notifier> | 按受众整形的事件发布 |
/// | orders | Arc<OrderService> | 订单创建与状态机 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub catalog: Arc<InMemoryCatalog>,
    pub directory: Arc<InMemoryStoreDirectory>,
    pub coupons: Arc<CouponStore>,
    pub ledger: Arc<InMemoryLedger>,
    pub hub: Arc<NotificationHub>,
    pub notifier: Arc<Notifier>,
    pub orders: Arc<OrderService>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序构建：
    /// 1. 协作方边界（目录、门店归属、优惠券、账本）
    /// 2. 通知 hub（每进程构造一次，按引用注入）
    /// 3. 打印、完成副作用处理器
    /// 4. 订单服务（定价引擎、编号分配、状态机）
    pub fn initialize(config: &Config) -> Self {
        let catalog = Arc::new(InMemoryCatalog::new());
        let directory = Arc::new(InMemoryStoreDirectory::new());
        let coupons = Arc::new(CouponStore::new());
        let ledger = Arc::new(InMemoryLedger::new());

        let hub = Arc::new(NotificationHub::new(
            directory.clone(),
            config.notify_channel_capacity,
        ));
        let notifier = Arc::new(Notifier::new(hub.clone()));

        let printer = Arc::new(PrintService::new(
            RendererBackend::from_name(&config.printer_backend),
            Arc::new(LogDispatcher),
        ));
        let completion = Arc::new(CompletionProcessor::new(ledger.clone()));

        let pricing = PricingEngine::new(
            catalog.clone(),
            coupons.clone(),
            Duration::from_millis(config.catalog_timeout_ms),
        );

        let orders = Arc::new(OrderService::new(
            Arc::new(InMemoryOrderStore::new()),
            catalog.clone(),
            coupons.clone(),
            directory.clone(),
            pricing,
            notifier.clone(),
            completion,
            printer,
            OrderServiceConfig {
                transition_retry_limit: config.transition_retry_limit,
                business_tz: config.business_tz,
                business_day_cutoff: config.business_day_cutoff,
            },
        ));

        Self {
            config: config.clone(),
            catalog,
            directory,
            coupons,
            ledger,
            hub,
            notifier,
            orders,
        }
    }
}

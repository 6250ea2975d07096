use chrono::NaiveTime;
use chrono_tz::Tz;

use crate::utils::time::parse_cutoff;

/// 服务器配置 - 所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (无) | 日志文件目录，缺省仅输出 stdout |
/// | CATALOG_TIMEOUT_MS | 2000 | 目录查询超时(毫秒) |
/// | NOTIFY_CHANNEL_CAPACITY | 256 | 每连接事件缓冲大小 |
/// | BUSINESS_TZ | UTC | 营业时区 |
/// | BUSINESS_DAY_CUTOFF | 06:00 | 营业日截止时刻 |
/// | PRINTER_BACKEND | epson | 小票渲染后端 (epson \| star) |
/// | TRANSITION_RETRY_LIMIT | 3 | 版本冲突重试上限 |
///
/// # 示例
///
/// ```ignore
/// HTTP_PORT=8080 BUSINESS_TZ=Europe/Madrid cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 日志级别
    pub log_level: String,
    /// 日志目录（可选）
    pub log_dir: Option<String>,
    /// 目录查询超时（毫秒）
    pub catalog_timeout_ms: u64,
    /// 每连接通知缓冲容量
    pub notify_channel_capacity: usize,
    /// 营业时区
    pub business_tz: Tz,
    /// 营业日截止时刻（之前的订单计入前一日）
    pub business_day_cutoff: NaiveTime,
    /// 小票渲染后端
    pub printer_backend: String,
    /// 状态变更版本冲突重试上限
    pub transition_retry_limit: u32,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
            catalog_timeout_ms: std::env::var("CATALOG_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2000),
            notify_channel_capacity: std::env::var("NOTIFY_CHANNEL_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(256),
            business_tz: std::env::var("BUSINESS_TZ")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(chrono_tz::UTC),
            business_day_cutoff: std::env::var("BUSINESS_DAY_CUTOFF")
                .ok()
                .and_then(|v| parse_cutoff(&v))
                .unwrap_or_else(|| NaiveTime::from_hms_opt(6, 0, 0).expect("valid cutoff")),
            printer_backend: std::env::var("PRINTER_BACKEND").unwrap_or_else(|_| "epson".into()),
            transition_retry_limit: std::env::var("TRANSITION_RETRY_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
        }
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

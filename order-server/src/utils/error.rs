//! 统一错误处理
//!
//! 提供应用级错误类型和响应结构：
//! - [`AppError`] - 应用错误枚举
//! - [`AppResponse`] - API 响应结构
//!
//! # 错误码规范
//!
//! | 前缀 | 分类 | 示例 |
//! |------|------|------|
//! | E0xxx | 业务/校验错误 | E0002 校验失败 |
//! | E2xxx | 权限错误 | E2001 无权限 |
//! | E3xxx | 认证错误 | E3001 未登录 |
//! | E9xxx | 系统错误 | E9001 内部错误 |
//!
//! 领域拒绝（[`Rejection`]）直接以其 SCREAMING_SNAKE_CASE 拒绝码作为
//! 响应 code 字段，前端负责本地化。

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use shared::order::{Rejection, RejectionCode};

use crate::orders::store::StoreError;

/// API 统一响应结构
///
/// ```json
/// {
///   "code": "E0000",
///   "message": "Success",
///   "data": { ... }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct AppResponse<T> {
    /// 错误码 (E0000 表示成功) 或领域拒绝码
    pub code: String,
    /// 消息
    pub message: String,
    /// 响应数据
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// 应用错误枚举
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== 认证/权限错误 ==========
    #[error("Authentication required")]
    /// 未登录 (401)
    Unauthorized,

    #[error("Permission denied: {0}")]
    /// 无权限 (403)
    Forbidden(String),

    // ========== 业务逻辑错误 ==========
    #[error("Resource not found: {0}")]
    /// 资源不存在 (404)
    NotFound(String),

    #[error("Validation failed: {0}")]
    /// 校验失败 (400)
    Validation(String),

    /// 领域拒绝 — 携带类型化拒绝码，状态码按码分类
    #[error(transparent)]
    Reject(#[from] Rejection),

    // ========== 系统错误 ==========
    #[error("Transient failure: {0}")]
    /// 短暂性失败，重试可能成功 (503)
    Transient(String),

    #[error("Internal server error: {0}")]
    /// 内部错误 (500)
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

/// Rejection 码到 HTTP 状态码的映射
fn rejection_status(code: RejectionCode) -> StatusCode {
    match code {
        RejectionCode::InvalidTransition => StatusCode::CONFLICT,
        RejectionCode::Forbidden => StatusCode::FORBIDDEN,
        RejectionCode::OrderNotFound => StatusCode::NOT_FOUND,
        RejectionCode::ValidationTimeout => StatusCode::GATEWAY_TIMEOUT,
        RejectionCode::AllocationConflict | RejectionCode::StaleVersion => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        RejectionCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        // Input/validation rejections
        _ => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "E3001".to_string(),
                "Please login first".to_string(),
            ),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "E2001".to_string(), msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "E0003".to_string(), msg.clone()),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "E0002".to_string(), msg.clone())
            }
            AppError::Reject(rejection) => (
                rejection_status(rejection.code),
                rejection.code.as_str().to_string(),
                rejection.message.clone(),
            ),
            AppError::Transient(msg) => {
                error!(target: "transient", error = %msg, "Transient failure surfaced to caller");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "E9003".to_string(),
                    "Service temporarily unavailable".to_string(),
                )
            }
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9001".to_string(),
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(AppResponse::<()> {
            code,
            message,
            data: None,
        });

        (status, body).into_response()
    }
}

// ========== Conversions ==========

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => AppError::NotFound(format!("Order {} not found", id)),
            StoreError::StaleVersion(..) => AppError::Reject(Rejection::new(
                RejectionCode::StaleVersion,
                e.to_string(),
            )),
            StoreError::Backend(msg) => AppError::Internal(msg),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}

// ========== Helper Constructors ==========

impl AppError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

// ========== Helper functions ==========

/// Create a successful response
pub fn ok<T: Serialize>(data: T) -> Json<AppResponse<T>> {
    Json(AppResponse {
        code: "E0000".to_string(),
        message: "Success".to_string(),
        data: Some(data),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_status_mapping() {
        assert_eq!(
            rejection_status(RejectionCode::InvalidTransition),
            StatusCode::CONFLICT
        );
        assert_eq!(
            rejection_status(RejectionCode::ProductUnavailable),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            rejection_status(RejectionCode::StaleVersion),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            rejection_status(RejectionCode::ValidationTimeout),
            StatusCode::GATEWAY_TIMEOUT
        );
    }
}

//! 错误处理模块
//!
//! 定义应用程序的错误类型，以及它们到 HTTP 响应的映射。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::middleware::current_request_id;

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 参数验证错误
    #[error("参数验证失败: {0}")]
    Validation(String),

    /// 上游拒绝了凭据
    #[error("认证失败: {0}")]
    Authentication(String),

    /// 资源不存在
    #[error("资源不存在: {0}")]
    NotFound(String),

    /// 上游返回了无法使用的响应
    #[error("上游服务错误: {0}")]
    Upstream(String),

    /// 连接错误
    #[error("连接错误: {0}")]
    Connection(String),

    /// 超时错误
    #[error("操作超时: {0}")]
    Timeout(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    Serialization(String),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<prometheus::Error> for AppError {
    fn from(e: prometheus::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AppError::Timeout(e.to_string())
        } else if e.is_connect() {
            AppError::Connection(e.to_string())
        } else if e.is_builder() {
            AppError::Internal(e.to_string())
        } else {
            AppError::Upstream(e.to_string())
        }
    }
}

/// 错误描述，随响应扩展传给访问日志中间件
#[derive(Debug, Clone)]
pub struct ErrorMessage(pub String);

/// Axum response implementation for AppError
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = (&self).into();
        let message = self.to_string();
        let mut body = ErrorResponse::new(&code, &message);
        if let Some(request_id) = current_request_id() {
            body = body.with_request_id(&request_id);
        }
        let mut response = (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(body),
        )
            .into_response();
        response.extensions_mut().insert(ErrorMessage(message));
        response
    }
}

/// 错误响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,
    /// 错误消息
    pub message: String,
    /// 请求 ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    /// 创建新错误响应
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            request_id: None,
        }
    }

    /// 添加请求 ID
    pub fn with_request_id(mut self, request_id: &str) -> Self {
        self.request_id = Some(request_id.to_string());
        self
    }
}

/// HTTP 状态码映射
impl From<&AppError> for (u16, String) {
    fn from(err: &AppError) -> (u16, String) {
        match err {
            AppError::Validation(_) => (400, "BAD_REQUEST".to_string()),
            AppError::Authentication(_) => (401, "UNAUTHORIZED".to_string()),
            AppError::NotFound(_) => (404, "NOT_FOUND".to_string()),
            AppError::Upstream(_) => (502, "UPSTREAM_ERROR".to_string()),
            AppError::Connection(_) => (503, "SERVICE_UNAVAILABLE".to_string()),
            AppError::Timeout(_) => (504, "TIMEOUT".to_string()),
            _ => (500, "INTERNAL_ERROR".to_string()),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::Validation("bad creds".into()), 400, "BAD_REQUEST")]
    #[case(AppError::Authentication("rejected".into()), 401, "UNAUTHORIZED")]
    #[case(AppError::NotFound("acme/missing".into()), 404, "NOT_FOUND")]
    #[case(AppError::Upstream("500".into()), 502, "UPSTREAM_ERROR")]
    #[case(AppError::Connection("refused".into()), 503, "SERVICE_UNAVAILABLE")]
    #[case(AppError::Timeout("30s".into()), 504, "TIMEOUT")]
    #[case(AppError::Io("disk".into()), 500, "INTERNAL_ERROR")]
    fn test_status_mapping(#[case] err: AppError, #[case] status: u16, #[case] code: &str) {
        let (s, c): (u16, String) = (&err).into();
        assert_eq!(s, status);
        assert_eq!(c, code);
    }

    #[tokio::test]
    async fn test_into_response_body() {
        let response = AppError::Validation("creds is required".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let message = response.extensions().get::<ErrorMessage>().unwrap();
        assert!(message.0.contains("creds is required"));

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.code, "BAD_REQUEST");
        assert!(parsed.message.contains("creds is required"));
        assert!(parsed.request_id.is_none());
    }

    #[test]
    fn test_error_response_builder() {
        let response = ErrorResponse::new("UPSTREAM_ERROR", "bad gateway").with_request_id("req-1");
        assert_eq!(response.request_id.as_deref(), Some("req-1"));

        let json = serde_json::to_value(ErrorResponse::new("NOT_FOUND", "gone")).unwrap();
        assert!(json.get("request_id").is_none());
    }
}

//! API 模块
//!
//! 扩展 UI 通过 Docker Desktop 的 `ddClient.extension.vm.service` 调用这里的路由。

pub mod app_state;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::api::app_state::AppState;
use crate::observability::{ObservabilityState, create_observability_router};

/// 业务路由
pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .merge(routes::package_routes::create_package_router())
        .with_state(app_state)
}

/// 完整应用：业务路由 + 可观测性路由 + 访问日志
pub fn create_app(app_state: AppState, observability_state: Arc<ObservabilityState>) -> Router {
    let metrics = app_state.metrics.clone();

    create_observability_router(observability_state)
        .merge(create_router(app_state))
        .layer(axum::middleware::from_fn_with_state(
            metrics,
            middleware::access_log_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

//! Package Routes

use axum::{Router, routing::get};

use crate::api::app_state::AppState;
use crate::api::handlers::package_handler::*;

/// 创建包路由器
pub fn create_package_router() -> Router<AppState> {
    Router::new()
        .route("/packages", get(list_packages))
        .route("/images", get(list_images))
}

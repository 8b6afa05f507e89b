//! Routes 模块
//!
//! 定义 API 路由。

pub mod package_routes;

//! Handlers 模块
//!
//! HTTP 请求处理程序。

pub mod package_handler;

pub use package_handler::*;

//! Cloudsmith Docker Desktop 扩展后端
//!
//! 在 guest-services unix socket 上为扩展 UI 提供 HTTP 接口，
//! 代理 Cloudsmith API 列出仓库中的 docker 镜像。

pub mod api;
pub mod cli;
pub mod cloudsmith;
pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod server;
pub mod services;

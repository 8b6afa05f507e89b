//! 配置管理模块
//!
//! 提供应用程序配置加载和管理功能，支持 TOML 配置文件、环境变量覆盖和命令行参数。

pub mod config;
pub mod loader;

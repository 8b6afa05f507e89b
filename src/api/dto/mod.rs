//! DTO 模块
//!
//! 数据传输对象，用于 API 请求的解析与校验。

pub mod package_dto;

pub use package_dto::*;

//! 服务模块

pub mod catalog;
pub mod grouping;
pub mod normalize;

pub use catalog::{CatalogRequest, CatalogService, create_catalog_service};

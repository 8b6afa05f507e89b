//! 数据模型模块
//!
//! Cloudsmith 包记录以及返回给 UI 的镜像记录。

pub mod image;
pub mod package;

pub use image::{Image, ImagePullTag};
pub use package::{Package, PullTag};

//! Cloudsmith 上游模块
//!
//! 对外只暴露 [`PackageSource`] trait，HTTP 实现见 [`client`]。

pub mod client;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::package::Package;

pub use client::HttpPackageSource;

/// 一个 Cloudsmith 仓库及访问它使用的 API key
#[derive(Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub organization: String,
    pub repository: String,
    pub api_key: Option<String>,
}

impl RepositoryRef {
    pub fn new(organization: &str, repository: &str, api_key: Option<&str>) -> Self {
        Self {
            organization: organization.to_string(),
            repository: repository.to_string(),
            api_key: api_key.filter(|key| !key.is_empty()).map(String::from),
        }
    }

    /// `organization/repository`
    pub fn slug(&self) -> String {
        format!("{}/{}", self.organization, self.repository)
    }
}

impl std::fmt::Debug for RepositoryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryRef")
            .field("organization", &self.organization)
            .field("repository", &self.repository)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

/// 包列表来源
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PackageSource: Send + Sync {
    /// 列出仓库中的 docker 包，按上传时间倒序
    async fn list_docker_packages(&self, repository: &RepositoryRef) -> Result<Vec<Package>>;
}

//! 镜像目录服务

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::cloudsmith::{PackageSource, RepositoryRef};
use crate::config::config::CatalogConfig;
use crate::error::Result;
use crate::models::{Image, Package};
use crate::observability::AppMetrics;
use crate::services::{grouping, normalize};

/// 一次目录查询
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRequest {
    pub repository: RepositoryRef,
    /// 按镜像名分组
    pub group: bool,
    /// 只使用摘要拉取
    pub pull_by_version: bool,
}

#[async_trait]
pub trait CatalogService: Send + Sync {
    /// 上游包列表，`group` 为 true 时按镜像名分组
    async fn packages(&self, request: &CatalogRequest) -> Result<Vec<Package>>;
    /// 转换后的镜像列表
    async fn images(&self, request: &CatalogRequest) -> Result<Vec<Image>>;
}

pub struct CatalogServiceImpl {
    source: Arc<dyn PackageSource>,
    config: CatalogConfig,
    metrics: Arc<AppMetrics>,
}

impl CatalogServiceImpl {
    pub fn new(source: Arc<dyn PackageSource>, config: CatalogConfig, metrics: Arc<AppMetrics>) -> Self {
        Self {
            source,
            config,
            metrics,
        }
    }

    async fn fetch(&self, request: &CatalogRequest) -> Result<Vec<Package>> {
        let result = self.source.list_docker_packages(&request.repository).await;
        self.metrics.record_upstream(result.is_ok());

        let packages = result.inspect_err(|e| {
            warn!(
                repository = %request.repository.slug(),
                error = %e,
                "Failed to list packages"
            )
        })?;

        debug!(
            repository = %request.repository.slug(),
            count = packages.len(),
            group = request.group,
            "Listed packages"
        );

        if request.group {
            Ok(grouping::group_by_name(
                packages,
                self.config.prefer_version_tags,
            ))
        } else {
            Ok(packages)
        }
    }
}

#[async_trait]
impl CatalogService for CatalogServiceImpl {
    async fn packages(&self, request: &CatalogRequest) -> Result<Vec<Package>> {
        let packages = self.fetch(request).await?;
        self.metrics.record_packages_served(packages.len());
        Ok(packages)
    }

    async fn images(&self, request: &CatalogRequest) -> Result<Vec<Image>> {
        let packages = self.fetch(request).await?;
        let images = normalize::normalize(packages, request.pull_by_version, &self.config);
        self.metrics.record_packages_served(images.len());
        Ok(images)
    }
}

pub fn create_catalog_service(
    source: Arc<dyn PackageSource>,
    config: CatalogConfig,
    metrics: Arc<AppMetrics>,
) -> Box<dyn CatalogService> {
    Box::new(CatalogServiceImpl::new(source, config, metrics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloudsmith::MockPackageSource;
    use crate::error::AppError;
    use serde_json::json;

    fn packages() -> Vec<Package> {
        serde_json::from_value(json!([
            {"name": "web", "version": "d1", "namespace": "acme", "repository": "containers",
             "tags": {"version": ["1.0"]}, "architectures": [{"name": "amd64"}]},
            {"name": "web", "version": "d2", "namespace": "acme", "repository": "containers",
             "tags": {"version": ["0.9"]}, "architectures": [{"name": "amd64"}]},
        ]))
        .unwrap()
    }

    fn request(group: bool) -> CatalogRequest {
        CatalogRequest {
            repository: RepositoryRef::new("acme", "containers", Some("key")),
            group,
            pull_by_version: false,
        }
    }

    fn service(source: MockPackageSource) -> (CatalogServiceImpl, Arc<AppMetrics>) {
        let metrics = Arc::new(AppMetrics::new().unwrap());
        (
            CatalogServiceImpl::new(Arc::new(source), CatalogConfig::default(), metrics.clone()),
            metrics,
        )
    }

    #[tokio::test]
    async fn test_packages_passthrough_and_grouping() {
        let mut source = MockPackageSource::new();
        source
            .expect_list_docker_packages()
            .withf(|repo| repo.slug() == "acme/containers" && repo.api_key.as_deref() == Some("key"))
            .times(2)
            .returning(|_| Ok(packages()));
        let (service, _) = service(source);

        let raw = service.packages(&request(false)).await.unwrap();
        assert_eq!(raw.len(), 2);
        assert!(raw[0].pull_tags().is_none());

        let grouped = service.packages(&request(true)).await.unwrap();
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].pull_tags().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_images() {
        let mut source = MockPackageSource::new();
        source
            .expect_list_docker_packages()
            .returning(|_| Ok(packages()));
        let (service, metrics) = service(source);

        let images = service.images(&request(false)).await.unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].pull_tags[0].tag, "1.0");
        assert_eq!(images[1].pull_tags[0].tag, "0.9");
        assert!(metrics.gather().unwrap().contains("packages_served_total 2"));
    }

    #[tokio::test]
    async fn test_upstream_error_is_propagated_and_counted() {
        let mut source = MockPackageSource::new();
        source
            .expect_list_docker_packages()
            .returning(|_| Err(AppError::Authentication("bad key".into())));
        let (service, metrics) = service(source);

        let err = service.packages(&request(false)).await.unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
        assert!(
            metrics
                .gather()
                .unwrap()
                .contains(r#"cloudsmith_requests_total{outcome="error"} 1"#)
        );
    }
}

//! Cloudsmith HTTP 客户端

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, header::HeaderMap};
use tracing::{debug, warn};

use crate::cloudsmith::{PackageSource, RepositoryRef};
use crate::config::config::CloudsmithConfig;
use crate::error::{AppError, Result};
use crate::models::package::Package;

/// 分页总数响应头
pub const PAGE_TOTAL_HEADER: &str = "X-Pagination-Pagetotal";

/// API key 请求头
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// 只列出 docker 格式的包
const DOCKER_QUERY: &str = "format:docker";

/// 最新上传的排在前面
const SORT_ORDER: &str = "-date";

/// 错误响应体在日志和错误信息中保留的最大长度
const MAX_ERROR_BODY: usize = 200;

/// 基于 reqwest 的 [`PackageSource`] 实现
pub struct HttpPackageSource {
    client: reqwest::Client,
    base_url: String,
    page_size: u32,
    max_pages: u32,
}

impl HttpPackageSource {
    pub fn new(config: &CloudsmithConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
            max_pages: config.max_pages.max(1),
        })
    }

    /// `{base}/packages/{org}/{repo}/`
    pub fn packages_url(&self, repository: &RepositoryRef) -> String {
        format!(
            "{}/packages/{}/{}/",
            self.base_url,
            urlencoding::encode(&repository.organization),
            urlencoding::encode(&repository.repository)
        )
    }

    async fn fetch_page(
        &self,
        repository: &RepositoryRef,
        page: u32,
    ) -> Result<(Vec<Package>, Option<u32>)> {
        let mut request = self.client.get(self.packages_url(repository)).query(&[
            ("page", page.to_string()),
            ("page_size", self.page_size.to_string()),
            ("query", DOCKER_QUERY.to_string()),
            ("sort", SORT_ORDER.to_string()),
        ]);
        if let Some(api_key) = &repository.api_key {
            request = request.header(API_KEY_HEADER, api_key);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, repository, &body));
        }

        let page_total = page_total(response.headers());
        let packages = response.json::<Vec<Package>>().await.map_err(|e| {
            AppError::Upstream(format!("无法解析 Cloudsmith 包列表: {}", e))
        })?;

        Ok((packages, page_total))
    }
}

#[async_trait]
impl PackageSource for HttpPackageSource {
    async fn list_docker_packages(&self, repository: &RepositoryRef) -> Result<Vec<Package>> {
        let (mut packages, page_total) = self.fetch_page(repository, 1).await?;
        let last_page = page_total.unwrap_or(1).min(self.max_pages);

        debug!(
            repository = %repository.slug(),
            page_total = ?page_total,
            fetched = packages.len(),
            "Fetched first package page"
        );

        for page in 2..=last_page {
            let (more, _) = self.fetch_page(repository, page).await?;
            if more.is_empty() {
                break;
            }
            packages.extend(more);
        }

        if page_total.is_some_and(|total| total > self.max_pages) {
            warn!(
                repository = %repository.slug(),
                max_pages = self.max_pages,
                "Package listing truncated at max_pages"
            );
        }

        Ok(packages)
    }
}

fn page_total(headers: &HeaderMap) -> Option<u32> {
    headers
        .get(PAGE_TOTAL_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

fn status_error(status: StatusCode, repository: &RepositoryRef, body: &str) -> AppError {
    let body: String = body.chars().take(MAX_ERROR_BODY).collect();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Authentication(format!(
            "Cloudsmith rejected credentials for {} ({})",
            repository.slug(),
            status
        )),
        StatusCode::NOT_FOUND => {
            AppError::NotFound(format!("repository {} not found", repository.slug()))
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            AppError::Timeout(format!("Cloudsmith returned {}", status))
        }
        _ => AppError::Upstream(format!("Cloudsmith returned {}: {}", status, body)),
    }
}

//! Prometheus 指标

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::error::Result;

/// 应用指标，使用独立的 Registry 以便测试中创建多个实例
#[derive(Clone)]
pub struct AppMetrics {
    registry: Registry,
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
    pub upstream_requests_total: IntCounterVec,
    pub packages_served_total: IntCounter,
}

impl AppMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests"),
            &["method", "path", "status"],
        )?;
        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            ),
            &["path"],
        )?;
        let upstream_requests_total = IntCounterVec::new(
            Opts::new(
                "cloudsmith_requests_total",
                "Package listings requested from Cloudsmith",
            ),
            &["outcome"],
        )?;
        let packages_served_total = IntCounter::new(
            "packages_served_total",
            "Packages returned to the extension UI",
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(upstream_requests_total.clone()))?;
        registry.register(Box::new(packages_served_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            upstream_requests_total,
            packages_served_total,
        })
    }

    /// 记录 HTTP 请求
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, seconds: f64) {
        let status = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, status.as_str()])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[path])
            .observe(seconds);
    }

    /// 记录一次上游调用
    pub fn record_upstream(&self, success: bool) {
        let outcome = if success { "success" } else { "error" };
        self.upstream_requests_total
            .with_label_values(&[outcome])
            .inc();
    }

    pub fn record_packages_served(&self, count: usize) {
        self.packages_served_total.inc_by(count as u64);
    }

    /// 生成 Prometheus 文本格式指标
    pub fn gather(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| crate::error::AppError::Internal(e.to_string()))
    }
}

impl std::fmt::Debug for AppMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppMetrics").finish_non_exhaustive()
    }
}

//! 请求中间件
//!
//! 每个请求分配一个请求 ID（沿用客户端传入的 `x-request-id`），写入响应头，
//! 并在请求结束时输出一条访问日志、记录指标。失败请求的日志带上错误描述。

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{info, warn};

use crate::error::ErrorMessage;
use crate::observability::AppMetrics;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

tokio::task_local! {
    static REQUEST_ID: String;
}

/// 当前请求的 ID，在请求处理范围之外返回 None
pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|id| id.clone()).ok()
}

/// 访问日志中间件
pub async fn access_log_middleware(
    State(metrics): State<Arc<AppMetrics>>,
    req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();

    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(String::from)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let method = req.method().clone();
    // 不记录查询参数，其中包含 API key
    let path = req.uri().path().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let mut response = REQUEST_ID.scope(request_id.clone(), next.run(req)).await;

    let status = response.status();
    let elapsed = start.elapsed();
    metrics.record_http_request(method.as_str(), &route, status.as_u16(), elapsed.as_secs_f64());

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    let latency_ms = elapsed.as_millis() as u64;
    let error = response
        .extensions()
        .get::<ErrorMessage>()
        .map(|message| message.0.as_str())
        .unwrap_or_default();
    if status.is_server_error() {
        warn!(
            id = %request_id,
            method = %method,
            uri = %path,
            status = status.as_u16(),
            latency_ms,
            error,
            "request failed"
        );
    } else {
        info!(
            id = %request_id,
            method = %method,
            uri = %path,
            status = status.as_u16(),
            latency_ms,
            error,
            "request completed"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use axum::{Router, body::Body, routing::get};
    use std::io;
    use std::sync::Mutex;
    use tower::ServiceExt;

    fn app(metrics: Arc<AppMetrics>) -> Router {
        Router::new()
            .route(
                "/echo",
                get(|| async { current_request_id().unwrap_or_default() }),
            )
            .route(
                "/fail",
                get(|| async {
                    Err::<String, _>(AppError::Upstream("boom upstream".into()))
                }),
            )
            .layer(axum::middleware::from_fn_with_state(
                metrics,
                access_log_middleware,
            ))
    }

    #[tokio::test]
    async fn test_generates_request_id() {
        let metrics = Arc::new(AppMetrics::new().unwrap());
        let response = app(metrics.clone())
            .oneshot(Request::builder().uri("/echo").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let header = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(uuid::Uuid::parse_str(&header).is_ok());

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, header.as_bytes());

        assert!(
            metrics
                .gather()
                .unwrap()
                .contains(r#"http_requests_total{method="GET",path="/echo",status="200"} 1"#)
        );
    }

    #[tokio::test]
    async fn test_keeps_incoming_request_id() {
        let metrics = Arc::new(AppMetrics::new().unwrap());
        let response = app(metrics)
            .oneshot(
                Request::builder()
                    .uri("/echo")
                    .header("x-request-id", "ui-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "ui-42");
    }

    /// 收集日志输出的内存 writer
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn lines(&self) -> Vec<serde_json::Value> {
            let raw = String::from_utf8(self.0.lock().unwrap().clone()).unwrap();
            raw.lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    async fn logged_request(uri: &str) -> serde_json::Value {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let metrics = Arc::new(AppMetrics::new().unwrap());
        app(metrics)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        logs.lines()
            .into_iter()
            .find(|line| line["fields"].get("latency_ms").is_some())
            .expect("access log line")
    }

    #[tokio::test]
    async fn test_access_log_includes_error_on_failure() {
        let line = logged_request("/fail").await;
        assert_eq!(line["level"], "WARN");
        assert_eq!(line["fields"]["status"], 502);
        assert_eq!(line["fields"]["uri"], "/fail");
        assert!(
            line["fields"]["error"]
                .as_str()
                .unwrap()
                .contains("boom upstream")
        );
    }

    #[tokio::test]
    async fn test_access_log_error_empty_on_success() {
        let line = logged_request("/echo").await;
        assert_eq!(line["level"], "INFO");
        assert_eq!(line["fields"]["status"], 200);
        assert_eq!(line["fields"]["error"], "");
    }

    #[test]
    fn test_no_request_id_outside_scope() {
        assert!(current_request_id().is_none());
    }
}

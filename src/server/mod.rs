//! Socket 服务器
//!
//! Docker Desktop 通过 guest-services 目录下的 unix socket 把 UI 请求转发给扩展后端。
//! axum 0.7 的 `serve` 只支持 TCP，这里自行 accept 并用 hyper 驱动每个连接。

use std::fs::{self, Permissions};
use std::future::Future;
use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use axum::Router;
use hyper::server::conn::http1;
use hyper_util::{rt::TokioIo, server::graceful::GracefulShutdown, service::TowerToHyperService};
use tokio::net::UnixListener;
use tracing::{debug, info, warn};

use crate::error::Result;

/// accept 失败后的退避时间
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// 关闭时等待已建立连接的最长时间
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// 绑定在 unix socket 上的服务器
#[derive(Debug)]
pub struct SocketServer {
    path: PathBuf,
    listener: UnixListener,
}

impl SocketServer {
    /// 删除残留的 socket 文件后绑定，并把文件权限设置为 `mode`
    pub fn bind(path: &Path, mode: u32) -> Result<Self> {
        match fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "Removed stale socket file"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let listener = UnixListener::bind(path)?;
        fs::set_permissions(path, Permissions::from_mode(mode))?;
        info!(path = %path.display(), mode = %format!("{:o}", mode), "Listening on unix socket");

        Ok(Self {
            path: path.to_path_buf(),
            listener,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 接受连接直到 `shutdown` 完成
    ///
    /// 退出时停止监听并删除 socket 文件，已建立的连接处理完当前请求后关闭，
    /// 最多等待 [`SHUTDOWN_GRACE`]。
    pub async fn serve<F>(self, router: Router, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let service = TowerToHyperService::new(router);
        let graceful = GracefulShutdown::new();
        tokio::pin!(shutdown);

        loop {
            let accepted = tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received, closing listener");
                    break;
                }
                accepted = self.listener.accept() => accepted,
            };

            let stream = match accepted {
                Ok((stream, _addr)) => stream,
                Err(e) => {
                    warn!(error = %e, "Failed to accept connection");
                    if accept_backoff(shutdown.as_mut()).await {
                        continue;
                    }
                    info!("Shutdown signal received, closing listener");
                    break;
                }
            };

            let connection = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service.clone());
            let connection = graceful.watch(connection);
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    debug!(error = %e, "Connection closed with error");
                }
            });
        }

        drop(self.listener);
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "Failed to remove socket file");
            }
        }

        if tokio::time::timeout(SHUTDOWN_GRACE, graceful.shutdown())
            .await
            .is_err()
        {
            warn!(
                grace_secs = SHUTDOWN_GRACE.as_secs(),
                "Open connections did not finish in time"
            );
        }

        Ok(())
    }
}

/// accept 出错后退避，EMFILE 之类的错误会立刻重现。期间收到关闭信号时返回 false
async fn accept_backoff<F>(shutdown: Pin<&mut F>) -> bool
where
    F: Future<Output = ()>,
{
    tokio::select! {
        _ = shutdown => false,
        _ = tokio::time::sleep(ACCEPT_ERROR_BACKOFF) => true,
    }
}

/// 等待 Ctrl-C 或 SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Docker Desktop 为扩展后端约定的 socket 路径
pub const DEFAULT_SOCKET_PATH: &str = "/run/guest-services/backend.sock";

/// Cloudsmith API 默认地址
pub const DEFAULT_API_BASE_URL: &str = "https://api.cloudsmith.io/v1";

/// Cloudsmith 容器镜像仓库域名
pub const DEFAULT_REGISTRY: &str = "docker.cloudsmith.io";

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// unix socket 路径
    pub socket_path: PathBuf,
    /// socket 文件权限
    pub socket_mode: u32,
    /// 设置后改为监听 TCP 地址（本地开发用）
    pub listen: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            socket_mode: 0o777,
            listen: None,
        }
    }
}

/// Cloudsmith 上游配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudsmithConfig {
    /// API 地址
    pub base_url: String,
    /// 每页数量
    pub page_size: u32,
    /// 最多拉取的页数
    pub max_pages: u32,
    /// 请求超时（秒）
    pub request_timeout: u64,
    /// User-Agent
    pub user_agent: String,
}

impl Default for CloudsmithConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.into(),
            page_size: 1000,
            max_pages: 1,
            request_timeout: 30,
            user_agent: format!("cloudsmith-docker-extension/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// 镜像目录配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// 拉取镜像使用的仓库域名
    pub registry: String,
    /// 返回给 UI 的来源标识
    pub root: String,
    /// 分组时优先使用版本标签而不是摘要
    pub prefer_version_tags: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            registry: DEFAULT_REGISTRY.into(),
            root: "cloudsmith".into(),
            prefer_version_tags: false,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 结构化日志格式
    pub structured: bool,
    /// 日志文件目录，未设置时输出到 stdout
    pub log_dir: Option<PathBuf>,
    /// 日志文件名前缀
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            structured: true,
            log_dir: None,
            file_prefix: "backend.log".into(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// Cloudsmith 上游配置
    pub cloudsmith: CloudsmithConfig,
    /// 镜像目录配置
    pub catalog: CatalogConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        let mut config = Self::default();
        config.server.listen = Some("127.0.0.1:8080".into());
        config.logging.level = "debug".into();
        config.logging.structured = false;
        config
    }
}

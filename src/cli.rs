//! 命令行参数

use std::path::PathBuf;

use clap::Parser;

use crate::config::config::AppConfig;

/// Cloudsmith Docker Desktop 扩展后端
#[derive(Parser, Debug)]
#[command(name = "cloudsmith-backend")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Unix domain socket to listen on
    #[arg(long, value_name = "PATH")]
    pub socket: Option<PathBuf>,

    /// Serve over TCP instead of the unix socket (e.g. 0.0.0.0:80)
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<String>,

    /// Path to the configuration file
    #[arg(long, short, value_name = "FILE", default_value = "config.toml")]
    pub config: PathBuf,

    /// Start from development defaults (TCP on 127.0.0.1:8080, debug logs)
    #[arg(long)]
    pub dev: bool,

    /// Override the log level
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Cli {
    /// 配置的最底层默认值
    pub fn defaults(&self) -> AppConfig {
        if self.dev {
            AppConfig::development()
        } else {
            AppConfig::default()
        }
    }

    /// 命令行参数覆盖配置文件和环境变量
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(socket) = &self.socket {
            config.server.socket_path = socket.clone();
            // 显式指定 socket 时不再使用 TCP
            if self.listen.is_none() {
                config.server.listen = None;
            }
        }
        if let Some(listen) = &self.listen {
            config.server.listen = Some(listen.clone());
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

//! 结构化日志初始化

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::config::LoggingConfig;
use crate::error::{AppError, Result};

/// 初始化日志
///
/// `RUST_LOG` 优先于配置中的级别。返回的 guard 需要一直持有，否则缓冲的日志会丢失。
pub fn init_tracing(config: &LoggingConfig) -> Result<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| AppError::Config(format!("invalid log level {}: {}", config.level, e)))?;

    let (writer, guard) = match &config.log_dir {
        Some(dir) => {
            tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, &config.file_prefix))
        }
        None => tracing_appender::non_blocking(std::io::stdout()),
    };

    let result = if config.structured {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_current_span(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
    };

    result.map_err(|e| AppError::Internal(format!("failed to set tracing subscriber: {}", e)))?;

    Ok(guard)
}

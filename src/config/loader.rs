use crate::config::config::AppConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::Path;

/// 环境变量前缀，嵌套字段用 `__` 分隔，例如 `CLOUDSMITH_SERVER__SOCKET_PATH`
pub const ENV_PREFIX: &str = "CLOUDSMITH_";

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从指定路径加载配置
    ///
    /// 优先级（后者覆盖前者）：
    /// 1. `defaults`
    /// 2. 配置文件
    /// 3. 环境变量
    pub fn load_from(path: &Path, defaults: AppConfig) -> Result<AppConfig, figment::Error> {
        Figment::from(Serialized::defaults(defaults))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if config.server.listen.is_none() && config.server.socket_path.as_os_str().is_empty() {
            return Err(ConfigValidationError::MissingSocketPath);
        }

        if config.server.socket_mode > 0o777 {
            return Err(ConfigValidationError::InvalidSocketMode(
                config.server.socket_mode,
            ));
        }

        if reqwest::Url::parse(&config.cloudsmith.base_url).is_err() {
            return Err(ConfigValidationError::InvalidBaseUrl(
                config.cloudsmith.base_url.clone(),
            ));
        }

        if config.cloudsmith.page_size == 0 {
            return Err(ConfigValidationError::InvalidPageSize);
        }

        if config.cloudsmith.max_pages == 0 {
            return Err(ConfigValidationError::InvalidMaxPages);
        }

        if config.cloudsmith.request_timeout == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }

        Ok(())
    }
}

/// 配置验证错误
#[derive(thiserror::Error, Debug)]
pub enum ConfigValidationError {
    #[error("未配置 socket 路径，也未配置 TCP 监听地址")]
    MissingSocketPath,

    #[error("socket 权限无效: {0:o}")]
    InvalidSocketMode(u32),

    #[error("Cloudsmith API 地址无效: {0}")]
    InvalidBaseUrl(String),

    #[error("分页大小无效，必须大于 0")]
    InvalidPageSize,

    #[error("最大页数无效，必须大于 0")]
    InvalidMaxPages,

    #[error("请求超时无效，必须大于 0")]
    InvalidTimeout,
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use std::path::PathBuf;

    fn load() -> Result<AppConfig, figment::Error> {
        ConfigLoader::load_from(Path::new("config.toml"), AppConfig::default())
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        Jail::expect_with(|_jail| {
            let config = load()?;
            assert_eq!(config.cloudsmith.page_size, 1000);
            assert_eq!(config.server.socket_mode, 0o777);
            Ok(())
        });
    }

    #[test]
    fn test_file_and_env_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [server]
                socket_path = "/tmp/ext/backend.sock"

                [cloudsmith]
                max_pages = 5
                "#,
            )?;
            jail.set_env("CLOUDSMITH_CLOUDSMITH__MAX_PAGES", "3");
            jail.set_env("CLOUDSMITH_LOGGING__LEVEL", "debug");

            let config = load()?;
            assert_eq!(
                config.server.socket_path,
                PathBuf::from("/tmp/ext/backend.sock")
            );
            assert_eq!(config.cloudsmith.max_pages, 3);
            assert_eq!(config.logging.level, "debug");
            assert_eq!(config.cloudsmith.page_size, 1000);
            Ok(())
        });
    }

    #[test]
    fn test_load_from_keeps_supplied_defaults() {
        Jail::expect_with(|_jail| {
            let config =
                ConfigLoader::load_from(Path::new("missing.toml"), AppConfig::development())?;
            assert_eq!(config.server.listen.as_deref(), Some("127.0.0.1:8080"));
            Ok(())
        });
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        assert!(ConfigLoader::validate(&config).is_ok());

        config.cloudsmith.base_url = "not a url".into();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidBaseUrl(_))
        ));

        let mut config = AppConfig::default();
        config.cloudsmith.page_size = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidPageSize)
        ));

        let mut config = AppConfig::default();
        config.server.socket_mode = 0o4777;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidSocketMode(_))
        ));

        let mut config = AppConfig::default();
        config.server.socket_path = PathBuf::new();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::MissingSocketPath)
        ));
        config.server.listen = Some("127.0.0.1:8080".into());
        assert!(ConfigLoader::validate(&config).is_ok());
    }
}

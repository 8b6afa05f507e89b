//! 包查询 DTO
//!
//! UI 把凭据和开关序列化为 JSON，放在 `creds` 查询参数中传递：
//! `/packages?creds={"api_key":"...","organization":"acme","repo":"containers","group":true}`

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::cloudsmith::RepositoryRef;
use crate::error::AppError;
use crate::services::CatalogRequest;

/// Cloudsmith 组织和仓库的 slug 格式
static SLUG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("valid slug regex"));

/// 查询参数
#[derive(Debug, Default, Deserialize)]
pub struct CredsParams {
    pub creds: Option<String>,
}

/// `creds` 参数中的 JSON 文档
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct CredsQuery {
    pub api_key: String,
    pub organization: String,
    pub repo: String,
    pub group: bool,
    #[serde(rename = "pullByVersion", alias = "pull_by_version")]
    pub pull_by_version: bool,
}

impl std::fmt::Debug for CredsQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredsQuery")
            .field("organization", &self.organization)
            .field("repo", &self.repo)
            .field("group", &self.group)
            .field("pull_by_version", &self.pull_by_version)
            .finish_non_exhaustive()
    }
}

impl CredsQuery {
    /// 解析 `creds` 参数
    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        let raw = raw
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .ok_or_else(|| AppError::Validation("creds query parameter is required".to_string()))?;

        serde_json::from_str(raw)
            .map_err(|e| AppError::Validation(format!("creds is not valid JSON: {}", e)))
    }

    /// 校验并转换为目录查询
    pub fn into_request(self) -> Result<CatalogRequest, AppError> {
        validate_slug("organization", &self.organization)?;
        validate_slug("repo", &self.repo)?;

        Ok(CatalogRequest {
            repository: RepositoryRef::new(
                self.organization.trim(),
                self.repo.trim(),
                Some(self.api_key.trim()),
            ),
            group: self.group,
            pull_by_version: self.pull_by_version,
        })
    }
}

fn validate_slug(field: &str, value: &str) -> Result<(), AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{} cannot be empty", field)));
    }
    if !SLUG_PATTERN.is_match(value) {
        return Err(AppError::Validation(format!(
            "{} contains invalid characters: {}",
            field, value
        )));
    }
    Ok(())
}

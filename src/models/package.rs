//! Cloudsmith 包记录
//!
//! 上游返回的字段很多且会变化，这里保留完整的 JSON 对象，只对用到的字段提供访问方法。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 摘要标签前缀
pub const DIGEST_PREFIX: &str = "sha256:";

/// 单个 Cloudsmith 包（一个镜像版本）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Package(Map<String, Value>);

impl Package {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: &str, value: Value) -> Option<Value> {
        self.0.insert(key.to_string(), value)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    /// 包版本，对 docker 包来说是镜像摘要（不含 `sha256:` 前缀）
    pub fn version(&self) -> Option<&str> {
        self.str_field("version")
    }

    pub fn namespace(&self) -> Option<&str> {
        self.str_field("namespace")
    }

    pub fn repository(&self) -> Option<&str> {
        self.str_field("repository")
    }

    pub fn display_name(&self) -> Option<&str> {
        self.str_field("display_name")
    }

    /// 包类型描述，例如 `image` 或 `manifest list`
    pub fn type_display(&self) -> Value {
        self.0.get("type_display").cloned().unwrap_or(Value::Null)
    }

    /// `tags` 对象，缺失时为 null
    pub fn tags(&self) -> Value {
        self.0.get("tags").cloned().unwrap_or(Value::Null)
    }

    pub fn architectures(&self) -> Value {
        self.0.get("architectures").cloned().unwrap_or(Value::Null)
    }

    /// `tags.version` 中的第一个标签
    pub fn version_tag(&self) -> Option<&str> {
        self.0.get("tags").and_then(first_version_tag)
    }

    /// 基于摘要的标签：`sha256:<version>`
    pub fn digest_tag(&self) -> String {
        format!("{}{}", DIGEST_PREFIX, self.version().unwrap_or_default())
    }

    /// 分组后附加的 `pullTags`
    pub fn pull_tags(&self) -> Option<&Vec<Value>> {
        self.0.get("pullTags").and_then(Value::as_array)
    }
}

/// 从 `tags` 对象中取 `version` 数组的第一个字符串
pub fn first_version_tag(tags: &Value) -> Option<&str> {
    tags.get("version")
        .and_then(Value::as_array)
        .and_then(|versions| versions.first())
        .and_then(Value::as_str)
        .filter(|tag| !tag.is_empty())
}

/// 分组结果中的单个可拉取标签
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullTag {
    pub tag: String,
    pub architectures: Value,
    pub tags: Value,
    #[serde(rename = "type")]
    pub kind: Value,
}

impl PullTag {
    pub fn from_package(package: &Package, tag: String) -> Self {
        Self {
            tag,
            architectures: package.architectures(),
            tags: package.tags(),
            kind: package.type_display(),
        }
    }
}

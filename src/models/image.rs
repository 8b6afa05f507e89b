//! 返回给扩展 UI 的镜像记录

use serde::Serialize;
use serde_json::{Map, Value};

/// 由 [`Image`] 显式给出、不再从原始包记录透传的字段
pub(crate) const IMAGE_FIELDS: &[&str] = &[
    "root",
    "name",
    "namespace",
    "repository",
    "fullName",
    "pullName",
    "architectures",
    "tags",
    "publicAccess",
    "version",
    "pullTags",
];

/// 可直接拉取的镜像
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub root: String,
    pub name: String,
    pub namespace: String,
    pub repository: String,
    /// `<namespace> / <repository> / <display_name>`
    pub full_name: String,
    /// `<registry>/<namespace>/<repository>/<name>`
    pub pull_name: String,
    pub architectures: Vec<String>,
    pub tags: Value,
    pub public_access: bool,
    pub version: String,
    pub pull_tags: Vec<ImagePullTag>,
    /// 其余上游字段原样透传（大小、上传时间、状态等）
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// 镜像的单个可拉取标签
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePullTag {
    pub tag: String,
    pub architectures: Vec<String>,
    pub tags: Value,
    #[serde(rename = "type")]
    pub kind: Value,
    /// `docker pull` 使用的完整引用
    pub pull_ref: String,
}

/// 摘要用 `image@sha256:...`，标签用 `image:tag`
pub fn pull_ref(image: &str, tag: &str) -> String {
    if tag.starts_with("sha256") {
        format!("{}@{}", image, tag)
    } else {
        format!("{}:{}", image, tag)
    }
}

/// `[{"name": "amd64"}, ...]` 转为 `["amd64", ...]`，已经是字符串的元素保持不变
pub fn architecture_names(architectures: &Value) -> Vec<String> {
    architectures
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(name) => Some(name.clone()),
                    other => other.get("name").and_then(Value::as_str).map(String::from),
                })
                .collect()
        })
        .unwrap_or_default()
}

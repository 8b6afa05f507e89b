//! 把 Cloudsmith 包转换为 UI 直接使用的镜像记录

use std::collections::HashSet;

use serde_json::Value;

use crate::config::config::CatalogConfig;
use crate::models::image::{IMAGE_FIELDS, Image, ImagePullTag, architecture_names, pull_ref};
use crate::models::package::{DIGEST_PREFIX, Package, first_version_tag};

/// 转换包列表
///
/// 未分组的包：首次出现的 `name:version` 使用版本标签，之后重复的以及没有版本标签的使用摘要。
/// 已分组的包：每个镜像内首次出现的版本标签替换原有标签，其余保留分组时选定的标签。
/// `pull_by_version` 为 true 时一律使用摘要（即 UI 中的 "Only pull by digest"）。
pub fn normalize(packages: Vec<Package>, pull_by_version: bool, config: &CatalogConfig) -> Vec<Image> {
    let mut seen_tags: HashSet<String> = HashSet::new();

    packages
        .into_iter()
        .map(|package| normalize_one(package, pull_by_version, config, &mut seen_tags))
        .collect()
}

fn normalize_one(
    package: Package,
    pull_by_version: bool,
    config: &CatalogConfig,
    seen_tags: &mut HashSet<String>,
) -> Image {
    let name = package.name().unwrap_or_default().to_string();
    let namespace = package.namespace().unwrap_or_default().to_string();
    let repository = package.repository().unwrap_or_default().to_string();
    let display_name = package.display_name().unwrap_or(&name).to_string();
    let version = package.version().unwrap_or_default().to_string();
    let pull_name = format!("{}/{}/{}/{}", config.registry, namespace, repository, name);

    let pull_tags = match package.pull_tags() {
        Some(grouped) => grouped_pull_tags(grouped, pull_by_version, &pull_name),
        None => {
            let tag = match package.version_tag() {
                Some(version_tag)
                    if !pull_by_version && seen_tags.insert(format!("{}:{}", name, version_tag)) =>
                {
                    version_tag.to_string()
                }
                _ => package.digest_tag(),
            };
            vec![ImagePullTag {
                pull_ref: pull_ref(&pull_name, &tag),
                tag,
                architectures: architecture_names(&package.architectures()),
                tags: package.tags(),
                kind: package.type_display(),
            }]
        }
    };

    let architectures = architecture_names(&package.architectures());
    let tags = package.tags();
    let mut details = package.into_inner();
    for field in IMAGE_FIELDS {
        details.remove(*field);
    }

    Image {
        root: config.root.clone(),
        full_name: format!("{} / {} / {}", namespace, repository, display_name),
        pull_name,
        name,
        namespace,
        repository,
        architectures,
        tags,
        public_access: false,
        version,
        pull_tags,
        details,
    }
}

fn grouped_pull_tags(grouped: &[Value], pull_by_version: bool, pull_name: &str) -> Vec<ImagePullTag> {
    let mut used_versions: HashSet<&str> = HashSet::new();

    grouped
        .iter()
        .map(|entry| {
            let tags = entry.get("tags").cloned().unwrap_or(Value::Null);
            let mut tag = entry
                .get("tag")
                .and_then(Value::as_str)
                .map(String::from)
                .unwrap_or_else(|| DIGEST_PREFIX.to_string());

            if !pull_by_version {
                if let Some(version_tag) = entry.get("tags").and_then(first_version_tag) {
                    if used_versions.insert(version_tag) {
                        tag = version_tag.to_string();
                    }
                }
            }

            ImagePullTag {
                pull_ref: pull_ref(pull_name, &tag),
                tag,
                architectures: architecture_names(entry.get("architectures").unwrap_or(&Value::Null)),
                tags,
                kind: entry.get("type").cloned().unwrap_or(Value::Null),
            }
        })
        .collect()
}

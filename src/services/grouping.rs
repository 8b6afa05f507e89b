//! 按镜像名分组
//!
//! Cloudsmith 把每个镜像版本作为独立的包返回。分组后每个镜像名只保留第一次出现的包，
//! 同名的其余版本以 `pullTags` 的形式挂在它下面，顺序与上游一致。

use std::collections::HashMap;

use serde_json::Value;

use crate::models::package::{Package, PullTag};

/// 选择分组时每个版本使用的标签
pub fn select_tag(package: &Package, prefer_version_tags: bool) -> String {
    if prefer_version_tags {
        if let Some(tag) = package.version_tag() {
            return tag.to_string();
        }
    }
    package.digest_tag()
}

/// 按 `name` 分组，保留首次出现的顺序
pub fn group_by_name(packages: Vec<Package>, prefer_version_tags: bool) -> Vec<Package> {
    let mut groups: Vec<(Package, Vec<PullTag>)> = Vec::new();
    // name 的 JSON 文本 -> groups 下标；缺失的 name 也归为一组
    let mut index: HashMap<String, usize> = HashMap::new();

    for package in packages {
        let key = package
            .get("name")
            .map(Value::to_string)
            .unwrap_or_default();
        let pull_tag = PullTag::from_package(&package, select_tag(&package, prefer_version_tags));

        match index.get(&key) {
            Some(&position) => groups[position].1.push(pull_tag),
            None => {
                index.insert(key, groups.len());
                groups.push((package, vec![pull_tag]));
            }
        }
    }

    groups
        .into_iter()
        .map(|(mut package, pull_tags)| {
            let pull_tags = pull_tags
                .into_iter()
                .filter_map(|tag| serde_json::to_value(tag).ok())
                .collect();
            package.insert("pullTags", Value::Array(pull_tags));
            package
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn package(name: &str, version: &str, version_tags: &[&str]) -> Package {
        serde_json::from_value(json!({
            "name": name,
            "version": version,
            "tags": {"version": version_tags},
            "architectures": [{"name": "amd64"}],
            "type_display": "image",
        }))
        .unwrap()
    }

    #[test]
    fn test_groups_preserve_first_appearance_order() {
        let packages = vec![
            package("web", "d1", &["2.0"]),
            package("api", "d2", &["1.0"]),
            package("web", "d3", &["1.9"]),
            package("worker", "d4", &[]),
            package("api", "d5", &[]),
        ];

        let grouped = group_by_name(packages, false);
        let names: Vec<_> = grouped.iter().filter_map(Package::name).collect();
        assert_eq!(names, vec!["web", "api", "worker"]);

        let web_tags = grouped[0].pull_tags().unwrap();
        assert_eq!(web_tags.len(), 2);
        assert_eq!(web_tags[0]["tag"], "sha256:d1");
        assert_eq!(web_tags[1]["tag"], "sha256:d3");
        assert_eq!(web_tags[1]["tags"], json!({"version": ["1.9"]}));
        assert_eq!(web_tags[0]["type"], "image");

        // 分组保留的是首个版本的其余字段
        assert_eq!(grouped[0].version(), Some("d1"));
        assert_eq!(grouped[2].pull_tags().unwrap().len(), 1);
    }

    #[test]
    fn test_prefer_version_tags() {
        let grouped = group_by_name(
            vec![package("web", "d1", &["2.0", "latest"]), package("web", "d2", &[])],
            true,
        );
        let tags = grouped[0].pull_tags().unwrap();
        assert_eq!(tags[0]["tag"], "2.0");
        assert_eq!(tags[1]["tag"], "sha256:d2");
    }

    #[test]
    fn test_empty_input() {
        assert!(group_by_name(Vec::new(), false).is_empty());
    }

    #[test]
    fn test_packages_without_name_share_a_group() {
        let nameless: Package = serde_json::from_value(json!({"version": "d9"})).unwrap();
        let grouped = group_by_name(vec![nameless.clone(), nameless], false);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].pull_tags().unwrap().len(), 2);
    }
}

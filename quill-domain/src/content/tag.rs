use quill_api::extension::{Extension, GroupVersionKind, Metadata, UniqueKey};
use serde::{Deserialize, Serialize};
use super::constant;

/// Tag实体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub metadata: Metadata,
    pub spec: TagSpec,
}

impl Extension for Tag {
    fn gvk() -> GroupVersionKind {
        GroupVersionKind::new(constant::GROUP, constant::VERSION, constant::TAG_KIND)
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new(constant::TAG_NAME_INDEX, &self.spec.normalized_name)]
    }
}

impl Tag {
    /// 以首次出现的写法创建Tag，输入需非空
    pub fn new(display_name: &str) -> Self {
        Self {
            metadata: Metadata::generate(),
            spec: TagSpec {
                display_name: display_name.trim().to_string(),
                normalized_name: normalize_name(display_name),
            },
        }
    }

    pub fn id(&self) -> &str {
        &self.metadata.name
    }
}

/// TagSpec包含标签的规格信息
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagSpec {
    /// 首次出现时的写法，仅用于展示
    pub display_name: String,
    pub normalized_name: String,
}

/// 规范化名称：去掉首尾空白，合并内部空白，转小写
pub fn normalize_name(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

use quill_api::extension::{Extension, GroupVersionKind, Metadata, UniqueKey};
use serde::{Deserialize, Serialize};
use super::constant;

/// Series实体
///
/// 系列中的成员及其顺序保存在各文章的 `spec.series` 中。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Series {
    pub metadata: Metadata,
    pub spec: SeriesSpec,
}

impl Extension for Series {
    fn gvk() -> GroupVersionKind {
        GroupVersionKind::new(constant::GROUP, constant::VERSION, constant::SERIES_KIND)
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new(constant::SERIES_SLUG_INDEX, &self.spec.slug)]
    }
}

impl Series {
    pub fn new(spec: SeriesSpec) -> Self {
        Self {
            metadata: Metadata::generate(),
            spec,
        }
    }

    pub fn id(&self) -> &str {
        &self.metadata.name
    }
}

/// SeriesSpec包含系列的规格信息
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSpec {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

use quill_api::extension::{Extension, GroupVersionKind, Metadata, UniqueKey};
use serde::{Deserialize, Serialize};
use super::{constant, tag::normalize_name};

/// Category实体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub metadata: Metadata,
    pub spec: CategorySpec,
}

impl Extension for Category {
    fn gvk() -> GroupVersionKind {
        GroupVersionKind::new(constant::GROUP, constant::VERSION, constant::CATEGORY_KIND)
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new(constant::CATEGORY_NAME_INDEX, normalize_name(&self.spec.display_name))]
    }
}

impl Category {
    pub fn new(spec: CategorySpec) -> Self {
        let mut category = Self {
            metadata: Metadata::generate(),
            spec,
        };
        category.sync_labels();
        category
    }

    pub fn id(&self) -> &str {
        &self.metadata.name
    }

    pub fn parent(&self) -> Option<&str> {
        self.spec.parent.as_deref()
    }

    pub fn sync_labels(&mut self) {
        match self.spec.parent.clone() {
            Some(parent) => self.metadata.set_label(constant::CATEGORY_PARENT_LABEL, parent),
            None => self.metadata.remove_label(constant::CATEGORY_PARENT_LABEL),
        }
    }
}

/// CategorySpec包含分类的规格信息
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpec {
    pub display_name: String,
    pub slug: String,
    pub description: Option<String>,
    /// 父分类的metadata.name，为空表示根分类
    pub parent: Option<String>,
}

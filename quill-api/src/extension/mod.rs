pub mod batch;
pub mod client;
pub mod converter;
pub mod error;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use batch::{Batch, Committed, RawExtension, Write};
pub use client::ExtensionClient;
pub use converter::{ExtensionConverter, JSONExtensionConverter};
pub use error::ExtensionError;

/// GroupVersionKind 表示扩展对象的组、版本和类型
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    pub fn new(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// 该类型所有对象在存储中的名称前缀: {group}/{kind}/
    pub fn store_prefix(&self) -> String {
        format!("{}/{}/", self.group, self.kind)
    }

    /// 构建完整的存储名称: {group}/{kind}/{name}
    pub fn store_name(&self, name: &str) -> String {
        format!("{}{}", self.store_prefix(), name)
    }
}

impl std::fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.group, self.version, self.kind)
    }
}

/// Metadata 包含扩展对象的元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub name: String,
    /// 乐观锁版本号，由存储层维护
    pub version: Option<u64>,
    pub creation_timestamp: Option<chrono::DateTime<chrono::Utc>>,
    pub labels: Option<HashMap<String, String>>,
    pub annotations: Option<HashMap<String, String>>,
}

impl Metadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            creation_timestamp: Some(chrono::Utc::now()),
            labels: None,
            annotations: None,
        }
    }

    /// 使用随机UUID作为名称
    pub fn generate() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.as_ref()?.get(key).map(String::as_str)
    }

    pub fn set_label(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.labels
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
    }

    pub fn remove_label(&mut self, key: &str) {
        if let Some(labels) = self.labels.as_mut() {
            labels.remove(key);
        }
    }

    /// 删除所有以指定前缀开头的标签
    pub fn remove_labels_with_prefix(&mut self, prefix: &str) {
        if let Some(labels) = self.labels.as_mut() {
            labels.retain(|key, _| !key.starts_with(prefix));
        }
    }
}

/// UniqueKey 是唯一索引中的一个键
///
/// 存储层保证同一 (index, value) 在所有对象中最多出现一次。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniqueKey {
    pub index: String,
    pub value: String,
}

impl UniqueKey {
    pub fn new(index: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            value: value.into(),
        }
    }
}

/// Extension trait 是所有扩展对象的基础trait
pub trait Extension: Send + Sync {
    fn gvk() -> GroupVersionKind
    where
        Self: Sized;

    fn metadata(&self) -> &Metadata;

    fn metadata_mut(&mut self) -> &mut Metadata;

    /// 该对象当前占用的唯一索引键
    fn unique_keys(&self) -> Vec<UniqueKey> {
        Vec::new()
    }
}

/// ListOptions 用于查询扩展对象
///
/// `label_selector` 形如 `a=b,c!=d,e`，多个条件之间为AND关系。
/// `size` 为空时返回全部结果。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListOptions {
    pub label_selector: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl ListOptions {
    pub fn with_label_selector(selector: impl Into<String>) -> Self {
        Self {
            label_selector: Some(selector.into()),
            ..Self::default()
        }
    }

    /// 检查标签是否满足label_selector
    pub fn matches(&self, labels: Option<&HashMap<String, String>>) -> bool {
        let Some(selector) = self.label_selector.as_deref() else {
            return true;
        };
        selector
            .split(',')
            .map(str::trim)
            .filter(|requirement| !requirement.is_empty())
            .all(|requirement| {
                let lookup = |key: &str| labels.and_then(|l| l.get(key.trim()));
                if let Some((key, value)) = requirement.split_once("!=") {
                    lookup(key).map(|v| v != value.trim()).unwrap_or(true)
                } else if let Some((key, value)) = requirement.split_once('=') {
                    lookup(key).map(|v| v == value.trim()).unwrap_or(false)
                } else if let Some(key) = requirement.strip_prefix('!') {
                    lookup(key).is_none()
                } else {
                    lookup(requirement).is_some()
                }
            })
    }
}

/// ListResult 包含查询结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
}

impl<T> ListResult<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32, size: u32) -> Self {
        Self {
            items,
            total,
            page,
            size,
        }
    }

    /// 对已过滤、已排序的完整结果按ListOptions分页（page从0开始）
    pub fn paginate(items: Vec<T>, options: &ListOptions) -> Self {
        let total = items.len() as u64;
        match options.size {
            Some(size) if size > 0 => {
                let page = options.page.unwrap_or(0);
                let skip = page as usize * size as usize;
                let items = items.into_iter().skip(skip).take(size as usize).collect();
                Self::new(items, total, page, size)
            }
            _ => {
                let size = items.len() as u32;
                Self::new(items, total, 0, size)
            }
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> ListResult<U> {
        ListResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            size: self.size,
        }
    }
}

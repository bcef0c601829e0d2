use crate::extension::{Extension, ExtensionConverter, ExtensionError, JSONExtensionConverter, UniqueKey};
use serde::Serialize;
use std::collections::HashMap;

/// RawExtension 是扩展对象的存储形式
#[derive(Debug, Clone, PartialEq)]
pub struct RawExtension {
    /// 完整存储名称: {group}/{kind}/{name}
    pub name: String,
    pub data: Vec<u8>,
    /// 写入时为期望的当前版本，读取时为存储中的版本
    pub version: Option<u64>,
    pub unique_keys: Vec<UniqueKey>,
}

/// 单个写操作
#[derive(Debug, Clone)]
pub enum Write {
    /// 创建，名称已存在时失败
    Create(RawExtension),
    /// 更新，`version` 不为空时必须与存储中的版本一致
    Update(RawExtension),
    /// 删除，`version` 不为空时必须与存储中的版本一致
    Delete { name: String, version: Option<u64> },
}

impl Write {
    pub fn name(&self) -> &str {
        match self {
            Write::Create(raw) | Write::Update(raw) => &raw.name,
            Write::Delete { name, .. } => name,
        }
    }
}

/// Batch 是一个工作单元：其中的写操作要么全部提交，要么全部不生效
///
/// 唯一索引按批次提交后的最终状态检查，因此同一批次内可以交换两个对象的索引值。
#[derive(Debug, Clone, Default)]
pub struct Batch {
    writes: Vec<Write>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create<E: Extension + Serialize>(&mut self, extension: &E) -> Result<&mut Self, ExtensionError> {
        let raw = JSONExtensionConverter.convert_to(extension)?;
        self.writes.push(Write::Create(raw));
        Ok(self)
    }

    pub fn update<E: Extension + Serialize>(&mut self, extension: &E) -> Result<&mut Self, ExtensionError> {
        let raw = JSONExtensionConverter.convert_to(extension)?;
        self.writes.push(Write::Update(raw));
        Ok(self)
    }

    pub fn delete<E: Extension>(&mut self, extension: &E) -> &mut Self {
        let metadata = extension.metadata();
        self.writes.push(Write::Delete {
            name: E::gvk().store_name(&metadata.name),
            version: metadata.version,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }
}

/// Committed 记录批次提交后各对象的新版本号
#[derive(Debug, Clone, Default)]
pub struct Committed {
    versions: HashMap<String, u64>,
}

impl Committed {
    pub fn new(versions: HashMap<String, u64>) -> Self {
        Self { versions }
    }

    pub fn version_of(&self, store_name: &str) -> Option<u64> {
        self.versions.get(store_name).copied()
    }

    /// 将提交后的版本号写回对象
    pub fn refresh<E: Extension>(&self, extension: &mut E) {
        let store_name = E::gvk().store_name(&extension.metadata().name);
        if let Some(version) = self.version_of(&store_name) {
            extension.metadata_mut().version = Some(version);
        }
    }
}

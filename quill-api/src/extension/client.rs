use crate::extension::{Batch, Committed, Extension, ExtensionError, ListOptions, ListResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// ExtensionClient trait 定义扩展对象的CRUD操作
///
/// 单对象写操作等价于只包含一个写操作的 [`Batch`]。
#[async_trait]
pub trait ExtensionClient: Send + Sync {
    async fn create<E: Extension + Serialize>(&self, extension: E) -> Result<E, ExtensionError>;

    /// 更新对象，`metadata.version` 必须与存储中的版本一致
    async fn update<E: Extension + Serialize>(&self, extension: E) -> Result<E, ExtensionError>;

    async fn delete<E: Extension>(&self, name: &str) -> Result<(), ExtensionError>;

    async fn fetch<E: Extension + DeserializeOwned>(&self, name: &str) -> Result<Option<E>, ExtensionError>;

    /// 通过唯一索引查找对象
    async fn fetch_by_unique_key<E: Extension + DeserializeOwned>(
        &self,
        index: &str,
        value: &str,
    ) -> Result<Option<E>, ExtensionError>;

    async fn list<E: Extension + DeserializeOwned>(&self, options: ListOptions) -> Result<ListResult<E>, ExtensionError>;

    /// 原子地提交一个批次
    async fn apply(&self, batch: Batch) -> Result<Committed, ExtensionError>;
}

use quill_api::extension::{
    Batch, Committed, Extension, ExtensionClient, ExtensionConverter, ExtensionError, JSONExtensionConverter,
    ListOptions, ListResult, Write,
};
use crate::database::ExtensionRepository;
use std::sync::Arc;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// ReactiveExtensionClient 扩展客户端实现
///
/// 负责对象与存储形式之间的转换、标签过滤和分页，持久化委托给ExtensionRepository。
#[derive(Clone)]
pub struct ReactiveExtensionClient {
    repository: Arc<dyn ExtensionRepository>,
    converter: JSONExtensionConverter,
}

impl ReactiveExtensionClient {
    pub fn new(repository: Arc<dyn ExtensionRepository>) -> Self {
        Self {
            repository,
            converter: JSONExtensionConverter,
        }
    }
}

#[async_trait]
impl ExtensionClient for ReactiveExtensionClient {
    async fn create<E: Extension + Serialize>(&self, mut extension: E) -> Result<E, ExtensionError> {
        let mut batch = Batch::new();
        batch.create(&extension)?;
        let committed = self.apply(batch).await?;
        committed.refresh(&mut extension);
        Ok(extension)
    }

    async fn update<E: Extension + Serialize>(&self, mut extension: E) -> Result<E, ExtensionError> {
        let mut batch = Batch::new();
        batch.update(&extension)?;
        let committed = self.apply(batch).await?;
        committed.refresh(&mut extension);
        Ok(extension)
    }

    async fn delete<E: Extension>(&self, name: &str) -> Result<(), ExtensionError> {
        let write = Write::Delete {
            name: E::gvk().store_name(name),
            version: None,
        };
        self.repository.apply(vec![write]).await?;
        Ok(())
    }

    async fn fetch<E: Extension + DeserializeOwned>(&self, name: &str) -> Result<Option<E>, ExtensionError> {
        match self.repository.find_by_name(&E::gvk().store_name(name)).await? {
            Some(raw) => Ok(Some(self.converter.convert_from(&raw)?)),
            None => Ok(None),
        }
    }

    async fn fetch_by_unique_key<E: Extension + DeserializeOwned>(
        &self,
        index: &str,
        value: &str,
    ) -> Result<Option<E>, ExtensionError> {
        let prefix = E::gvk().store_prefix();
        match self.repository.find_by_unique_key(index, value).await? {
            Some(raw) if raw.name.starts_with(&prefix) => Ok(Some(self.converter.convert_from(&raw)?)),
            _ => Ok(None),
        }
    }

    async fn list<E: Extension + DeserializeOwned>(&self, options: ListOptions) -> Result<ListResult<E>, ExtensionError> {
        let raws = self.repository.list_by_prefix(&E::gvk().store_prefix()).await?;

        let mut items = Vec::with_capacity(raws.len());
        for raw in &raws {
            let extension: E = self.converter.convert_from(raw)?;
            if options.matches(extension.metadata().labels.as_ref()) {
                items.push(extension);
            }
        }
        // 默认按创建时间排序
        items.sort_by(|a, b| {
            let (a, b) = (a.metadata(), b.metadata());
            a.creation_timestamp
                .cmp(&b.creation_timestamp)
                .then_with(|| a.name.cmp(&b.name))
        });

        Ok(ListResult::paginate(items, &options))
    }

    async fn apply(&self, batch: Batch) -> Result<Committed, ExtensionError> {
        if batch.is_empty() {
            return Ok(Committed::default());
        }
        tracing::debug!("Applying batch of {} writes", batch.len());
        self.repository.apply(batch.into_writes()).await
    }
}

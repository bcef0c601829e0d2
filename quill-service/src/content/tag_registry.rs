use async_trait::async_trait;
use quill_api::extension::{ExtensionClient, ListOptions};
use quill_domain::content::{constant, normalize_name, Tag};
use crate::error::ContentError;
use crate::settings::ContentSettings;
use std::collections::HashSet;
use std::sync::Arc;

/// Tag注册表trait
#[async_trait]
pub trait TagRegistry: Send + Sync {
    /// 解析标签名，不存在时创建
    async fn resolve(&self, name: &str) -> Result<Tag, ContentError>;

    /// 批量解析，规范化后相同的名称只解析一次，空白名称被忽略
    async fn resolve_all(&self, names: &[String]) -> Result<Vec<Tag>, ContentError>;

    /// 只查找，不创建
    async fn find(&self, name: &str) -> Result<Option<Tag>, ContentError>;

    async fn list(&self) -> Result<Vec<Tag>, ContentError>;
}

/// 一组标签名的解析结果，`created` 中的标签尚未写入存储
#[derive(Debug, Clone, Default)]
pub struct TagPlan {
    pub tags: Vec<Tag>,
    pub created: Vec<Tag>,
}

impl TagPlan {
    pub fn names(&self) -> impl Iterator<Item = String> + '_ {
        self.tags.iter().map(|tag| tag.id().to_string())
    }
}

pub struct DefaultTagRegistry<C: ExtensionClient> {
    client: Arc<C>,
    max_write_attempts: u32,
}

impl<C: ExtensionClient> DefaultTagRegistry<C> {
    pub fn new(client: Arc<C>, settings: &ContentSettings) -> Self {
        Self {
            client,
            max_write_attempts: settings.max_write_attempts,
        }
    }

    async fn find_normalized(&self, normalized: &str) -> Result<Option<Tag>, ContentError> {
        Ok(self
            .client
            .fetch_by_unique_key::<Tag>(constant::TAG_NAME_INDEX, normalized)
            .await?)
    }

    /// 解析一组标签名但不写入，新标签由调用方放进自己的批次
    ///
    /// 批次提交时若在 `tag.spec.normalizedName` 上冲突，重新规划即可拿到已存在的标签。
    pub async fn plan_all(&self, names: &[String]) -> Result<TagPlan, ContentError> {
        let mut plan = TagPlan::default();
        let mut seen = HashSet::new();
        for name in names {
            let normalized = normalize_name(name);
            if normalized.is_empty() || !seen.insert(normalized.clone()) {
                continue;
            }
            match self.find_normalized(&normalized).await? {
                Some(tag) => plan.tags.push(tag),
                None => {
                    let tag = Tag::new(name);
                    plan.created.push(tag.clone());
                    plan.tags.push(tag);
                }
            }
        }
        Ok(plan)
    }
}

#[async_trait]
impl<C: ExtensionClient> TagRegistry for DefaultTagRegistry<C> {
    async fn resolve(&self, name: &str) -> Result<Tag, ContentError> {
        let normalized = normalize_name(name);
        if normalized.is_empty() {
            return Err(ContentError::InvalidTagName(name.to_string()));
        }

        let mut attempts = 0;
        loop {
            if let Some(tag) = self.find_normalized(&normalized).await? {
                return Ok(tag);
            }
            match self.client.create(Tag::new(name)).await {
                Ok(tag) => {
                    tracing::info!("Created tag {} ({})", tag.spec.normalized_name, tag.id());
                    return Ok(tag);
                }
                // 并发创建失败的一方改为查找
                Err(e) if e.is_conflict() && attempts < self.max_write_attempts => {
                    attempts += 1;
                    tracing::debug!("Tag {} was created concurrently, looking it up", normalized);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn resolve_all(&self, names: &[String]) -> Result<Vec<Tag>, ContentError> {
        let mut seen = HashSet::new();
        let mut tags = Vec::new();
        for name in names {
            let normalized = normalize_name(name);
            if normalized.is_empty() || !seen.insert(normalized) {
                continue;
            }
            tags.push(self.resolve(name).await?);
        }
        Ok(tags)
    }

    async fn find(&self, name: &str) -> Result<Option<Tag>, ContentError> {
        let normalized = normalize_name(name);
        if normalized.is_empty() {
            return Ok(None);
        }
        self.find_normalized(&normalized).await
    }

    async fn list(&self) -> Result<Vec<Tag>, ContentError> {
        let mut tags = self.client.list::<Tag>(ListOptions::default()).await?.items;
        tags.sort_by(|a, b| a.spec.normalized_name.cmp(&b.spec.normalized_name));
        Ok(tags)
    }
}

use async_trait::async_trait;
use quill_api::extension::{ExtensionClient, ExtensionError, ListOptions};
use quill_domain::content::{constant, normalize_name, Category, CategorySpec};
use serde::Deserialize;
use crate::content::slug::slugify;
use crate::error::ContentError;
use crate::settings::ContentSettings;
use std::collections::HashMap;
use std::sync::Arc;

/// 创建分类的请求
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
    pub parent: Option<String>,
    pub description: Option<String>,
}

/// Category树trait
#[async_trait]
pub trait CategoryTree: Send + Sync {
    /// 检查分类存在且深度不超过上限
    async fn validate(&self, category: &str) -> Result<(), ContentError>;

    /// 从根到该分类的路径，用于面包屑导航
    async fn path_of(&self, category: &str) -> Result<Vec<Category>, ContentError>;

    async fn create(&self, request: CategoryRequest) -> Result<Category, ContentError>;

    /// 修改父分类，`None` 表示移到根
    async fn move_to(&self, category: &str, new_parent: Option<&str>) -> Result<Category, ContentError>;

    async fn get(&self, category: &str) -> Result<Option<Category>, ContentError>;

    async fn list(&self) -> Result<Vec<Category>, ContentError>;
}

pub struct DefaultCategoryTree<C: ExtensionClient> {
    client: Arc<C>,
    max_depth: usize,
    max_write_attempts: u32,
}

impl<C: ExtensionClient> DefaultCategoryTree<C> {
    pub fn new(client: Arc<C>, settings: &ContentSettings) -> Self {
        Self {
            client,
            max_depth: settings.max_category_depth,
            max_write_attempts: settings.max_write_attempts,
        }
    }

    fn depth_exceeded(&self, id: &str) -> ContentError {
        ContentError::CategoryDepthExceeded {
            id: id.to_string(),
            max_depth: self.max_depth,
        }
    }

    /// 以该分类为根的子树高度（只有自身时为1）
    async fn subtree_height(&self, root: &str) -> Result<usize, ContentError> {
        let all = self.list().await?;
        let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
        for category in &all {
            if let Some(parent) = category.parent() {
                children.entry(parent).or_default().push(category.id());
            }
        }

        let mut height = 0;
        let mut level = vec![root];
        while !level.is_empty() {
            height += 1;
            if height > self.max_depth {
                break;
            }
            level = level
                .iter()
                .flat_map(|id| children.get(id).cloned().unwrap_or_default())
                .collect();
        }
        Ok(height)
    }
}

#[async_trait]
impl<C: ExtensionClient> CategoryTree for DefaultCategoryTree<C> {
    async fn validate(&self, category: &str) -> Result<(), ContentError> {
        self.path_of(category).await.map(|_| ())
    }

    async fn path_of(&self, category: &str) -> Result<Vec<Category>, ContentError> {
        let mut path = Vec::new();
        let mut current = Some(category.to_string());
        while let Some(id) = current {
            if path.len() >= self.max_depth {
                return Err(self.depth_exceeded(category));
            }
            let node = self
                .client
                .fetch::<Category>(&id)
                .await?
                .ok_or(ContentError::CategoryNotFound(id))?;
            current = node.spec.parent.clone();
            path.push(node);
        }
        path.reverse();
        Ok(path)
    }

    async fn create(&self, request: CategoryRequest) -> Result<Category, ContentError> {
        let name = normalize_name(&request.name);
        if name.is_empty() {
            return Err(ContentError::InvalidCategory("category name must not be blank".to_string()));
        }

        let parent = request.parent.filter(|p| !p.trim().is_empty());
        if let Some(parent) = parent.as_deref() {
            let parent_path = self.path_of(parent).await?;
            if parent_path.len() + 1 > self.max_depth {
                return Err(self.depth_exceeded(parent));
            }
        }

        let category = Category::new(CategorySpec {
            display_name: request.name.trim().to_string(),
            slug: slugify(&request.name),
            description: request.description,
            parent,
        });
        match self.client.create(category).await {
            Ok(category) => {
                tracing::info!("Created category {} ({})", category.spec.display_name, category.id());
                Ok(category)
            }
            Err(ExtensionError::Conflict { .. }) => Err(ContentError::DuplicateCategory(request.name)),
            Err(e) => Err(e.into()),
        }
    }

    async fn move_to(&self, category: &str, new_parent: Option<&str>) -> Result<Category, ContentError> {
        let mut attempts = 0;
        loop {
            let mut node = self
                .client
                .fetch::<Category>(category)
                .await?
                .ok_or_else(|| ContentError::CategoryNotFound(category.to_string()))?;

            if let Some(parent) = new_parent {
                let cycle = || ContentError::CategoryCycle {
                    id: category.to_string(),
                    parent: parent.to_string(),
                };
                if parent == category {
                    return Err(cycle());
                }
                let parent_path = self.path_of(parent).await?;
                if parent_path.iter().any(|c| c.id() == category) {
                    return Err(cycle());
                }
                let height = self.subtree_height(category).await?;
                if parent_path.len() + height > self.max_depth {
                    return Err(self.depth_exceeded(category));
                }
            }

            node.spec.parent = new_parent.map(str::to_string);
            node.sync_labels();
            match self.client.update(node).await {
                Ok(node) => {
                    tracing::info!("Moved category {} under {:?}", category, new_parent);
                    return Ok(node);
                }
                Err(e @ ExtensionError::VersionMismatch { .. }) if attempts >= self.max_write_attempts => {
                    return Err(e.into())
                }
                Err(ExtensionError::VersionMismatch { .. }) => {
                    attempts += 1;
                    tracing::debug!("Category {} changed concurrently, retrying move", category);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn get(&self, category: &str) -> Result<Option<Category>, ContentError> {
        Ok(self.client.fetch(category).await?)
    }

    async fn list(&self) -> Result<Vec<Category>, ContentError> {
        Ok(self.client.list::<Category>(ListOptions::default()).await?.items)
    }
}

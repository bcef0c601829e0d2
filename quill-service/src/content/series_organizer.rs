use async_trait::async_trait;
use quill_api::extension::{Batch, ExtensionClient, ExtensionError, ListOptions};
use quill_domain::content::{constant, Post, Series, SeriesMembership, SeriesSpec};
use serde::{Deserialize, Serialize};
use crate::content::slug::{slug_candidate, slugify};
use crate::error::ContentError;
use crate::settings::ContentSettings;
use std::sync::Arc;

/// 创建系列的请求
#[derive(Debug, Clone, Deserialize)]
pub struct SeriesRequest {
    pub title: String,
    pub description: Option<String>,
}

/// 文章在系列中的前后文章
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeriesNavigation {
    pub series: Option<String>,
    pub previous: Option<String>,
    pub next: Option<String>,
}

/// 一次定位的规划结果，`shifted` 中是需要一起更新的其他成员
#[derive(Debug, Clone)]
pub struct PositionPlan {
    pub position: u32,
    pub shifted: Vec<Post>,
}

/// Series组织trait
#[async_trait]
pub trait SeriesOrganizer: Send + Sync {
    /// 把文章放到系列中的指定位置，返回最终位置
    async fn assign(&self, series: &str, post_id: &str, desired_position: Option<u32>) -> Result<u32, ContentError>;

    /// 移出系列，其余成员的位置不变
    async fn remove(&self, series: &str, post_id: &str) -> Result<(), ContentError>;

    /// 按位置升序返回文章ID
    async fn ordered(&self, series: &str) -> Result<Vec<String>, ContentError>;

    async fn create_series(&self, request: SeriesRequest) -> Result<Series, ContentError>;

    async fn get_series(&self, series: &str) -> Result<Option<Series>, ContentError>;

    async fn navigation(&self, post_id: &str) -> Result<SeriesNavigation, ContentError>;

    async fn set_completed(&self, series: &str, completed: bool) -> Result<Series, ContentError>;
}

pub struct DefaultSeriesOrganizer<C: ExtensionClient> {
    client: Arc<C>,
    step: u32,
    slug_max_attempts: u32,
    max_write_attempts: u32,
}

impl<C: ExtensionClient> DefaultSeriesOrganizer<C> {
    pub fn new(client: Arc<C>, settings: &ContentSettings) -> Self {
        Self {
            client,
            step: settings.series_step.max(1),
            slug_max_attempts: settings.slug_max_attempts,
            max_write_attempts: settings.max_write_attempts,
        }
    }

    async fn members(&self, series: &str) -> Result<Vec<Post>, ContentError> {
        let selector = format!("{}={}", constant::POST_SERIES_LABEL, series);
        let mut members = self
            .client
            .list::<Post>(ListOptions::with_label_selector(selector))
            .await?
            .items;
        members.sort_by_key(|post| post.spec.series.as_ref().map(|m| m.position));
        Ok(members)
    }

    async fn require_series(&self, series: &str) -> Result<Series, ContentError> {
        self.client
            .fetch::<Series>(series)
            .await?
            .ok_or_else(|| ContentError::not_found("Series", series))
    }

    /// 根据当前成员计算 `post_id` 的位置，不写入存储
    ///
    /// 目标位置已被占用时，所有位置 >= 目标位置的成员后移一位。
    pub async fn plan_position(
        &self,
        series: &str,
        post_id: &str,
        desired_position: Option<u32>,
    ) -> Result<PositionPlan, ContentError> {
        if desired_position == Some(0) {
            return Err(ContentError::InvalidSeriesPosition("positions start at 1".to_string()));
        }
        self.require_series(series).await?;

        let others: Vec<Post> = self
            .members(series)
            .await?
            .into_iter()
            .filter(|post| post.id() != post_id)
            .collect();
        let position_of = |post: &Post| post.spec.series.as_ref().map(|m| m.position).unwrap_or(0);

        let Some(desired) = desired_position else {
            let last = others.iter().map(position_of).max().unwrap_or(0);
            let position = last
                .checked_add(self.step)
                .ok_or_else(|| ContentError::InvalidSeriesPosition("series is full".to_string()))?;
            return Ok(PositionPlan {
                position,
                shifted: Vec::new(),
            });
        };

        if !others.iter().any(|post| position_of(post) == desired) {
            return Ok(PositionPlan {
                position: desired,
                shifted: Vec::new(),
            });
        }

        let mut shifted = Vec::new();
        for mut post in others.into_iter().filter(|post| position_of(post) >= desired) {
            let next = position_of(&post)
                .checked_add(1)
                .ok_or_else(|| ContentError::InvalidSeriesPosition("position overflow".to_string()))?;
            post.spec.series = Some(SeriesMembership::new(series, next));
            post.sync_labels();
            shifted.push(post);
        }
        Ok(PositionPlan {
            position: desired,
            shifted,
        })
    }

    async fn update_series<F>(&self, series: &str, mutate: F) -> Result<Series, ContentError>
    where
        F: Fn(&mut Series) + Send + Sync,
    {
        let mut attempts = 0;
        loop {
            let mut record = self.require_series(series).await?;
            mutate(&mut record);
            match self.client.update(record).await {
                Ok(record) => return Ok(record),
                Err(ExtensionError::VersionMismatch { .. }) if attempts < self.max_write_attempts => {
                    attempts += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[async_trait]
impl<C: ExtensionClient> SeriesOrganizer for DefaultSeriesOrganizer<C> {
    async fn assign(&self, series: &str, post_id: &str, desired_position: Option<u32>) -> Result<u32, ContentError> {
        let mut attempts = 0;
        loop {
            let mut post = self
                .client
                .fetch::<Post>(post_id)
                .await?
                .ok_or_else(|| ContentError::not_found("Post", post_id))?;
            let plan = self.plan_position(series, post_id, desired_position).await?;

            post.spec.series = Some(SeriesMembership::new(series, plan.position));
            post.sync_labels();

            let mut batch = Batch::new();
            for member in &plan.shifted {
                batch.update(member)?;
            }
            batch.update(&post)?;

            match self.client.apply(batch).await {
                Ok(_) => {
                    tracing::info!(
                        "Assigned post {} to series {} at position {} ({} members shifted)",
                        post_id,
                        series,
                        plan.position,
                        plan.shifted.len()
                    );
                    return Ok(plan.position);
                }
                Err(e) if e.is_retryable() && attempts < self.max_write_attempts => {
                    attempts += 1;
                    tracing::debug!("Series {} changed concurrently, re-planning: {}", series, e);
                }
                Err(e) if e.is_retryable() => {
                    return Err(ContentError::InvalidSeriesPosition(format!(
                        "could not place post {} in series {}: {}",
                        post_id, series, e
                    )))
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn remove(&self, series: &str, post_id: &str) -> Result<(), ContentError> {
        let mut attempts = 0;
        loop {
            let mut post = self
                .client
                .fetch::<Post>(post_id)
                .await?
                .ok_or_else(|| ContentError::not_found("Post", post_id))?;
            if post.spec.series.as_ref().map(|m| m.series.as_str()) != Some(series) {
                return Ok(());
            }

            post.spec.series = None;
            post.sync_labels();
            match self.client.update(post).await {
                Ok(_) => {
                    tracing::info!("Removed post {} from series {}", post_id, series);
                    return Ok(());
                }
                Err(ExtensionError::VersionMismatch { .. }) if attempts < self.max_write_attempts => {
                    attempts += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn ordered(&self, series: &str) -> Result<Vec<String>, ContentError> {
        self.require_series(series).await?;
        Ok(self
            .members(series)
            .await?
            .iter()
            .map(|post| post.id().to_string())
            .collect())
    }

    async fn create_series(&self, request: SeriesRequest) -> Result<Series, ContentError> {
        let base = slugify(&request.title);
        for n in 1..=self.slug_max_attempts {
            let series = Series::new(SeriesSpec {
                title: request.title.trim().to_string(),
                slug: slug_candidate(&base, n),
                description: request.description.clone(),
                completed: false,
            });
            match self.client.create(series).await {
                Ok(series) => {
                    tracing::info!("Created series {} ({})", series.spec.slug, series.id());
                    return Ok(series);
                }
                Err(e) if e.conflict_index() == Some(constant::SERIES_SLUG_INDEX) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(ContentError::SlugExhausted {
            base,
            attempts: self.slug_max_attempts,
        })
    }

    async fn get_series(&self, series: &str) -> Result<Option<Series>, ContentError> {
        Ok(self.client.fetch(series).await?)
    }

    async fn navigation(&self, post_id: &str) -> Result<SeriesNavigation, ContentError> {
        let post = self
            .client
            .fetch::<Post>(post_id)
            .await?
            .ok_or_else(|| ContentError::not_found("Post", post_id))?;
        let Some(membership) = post.spec.series else {
            return Ok(SeriesNavigation::default());
        };

        let ordered = self.ordered(&membership.series).await?;
        let index = ordered.iter().position(|id| id == post_id);
        Ok(SeriesNavigation {
            previous: index
                .and_then(|i| i.checked_sub(1))
                .and_then(|i| ordered.get(i).cloned()),
            next: index.and_then(|i| ordered.get(i + 1).cloned()),
            series: Some(membership.series),
        })
    }

    async fn set_completed(&self, series: &str, completed: bool) -> Result<Series, ContentError> {
        self.update_series(series, |record| record.spec.completed = completed)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::memory_client;
    use quill_domain::content::PostSpec;
    use quill_infra::ReactiveExtensionClient;
    use std::collections::HashSet;

    struct Fixture {
        client: Arc<ReactiveExtensionClient>,
        organizer: DefaultSeriesOrganizer<ReactiveExtensionClient>,
        series: String,
    }

    impl Fixture {
        async fn new() -> Self {
            let client = memory_client();
            let organizer = DefaultSeriesOrganizer::new(client.clone(), &ContentSettings::default());
            let series = organizer
                .create_series(SeriesRequest {
                    title: "Learning Rust".to_string(),
                    description: None,
                })
                .await
                .unwrap();
            Self {
                client,
                organizer,
                series: series.id().to_string(),
            }
        }

        async fn post(&self, slug: &str) -> String {
            let post = Post::new(PostSpec {
                title: slug.to_string(),
                slug: slug.to_string(),
                body: String::new(),
                excerpt: None,
                owner: "alice".to_string(),
                category: None,
                tags: Default::default(),
                series: None,
                featured: false,
            });
            self.client.create(post).await.unwrap().id().to_string()
        }

        async fn positions(&self) -> Vec<(String, u32)> {
            let mut result = Vec::new();
            for id in self.organizer.ordered(&self.series).await.unwrap() {
                let post: Post = self.client.fetch(&id).await.unwrap().unwrap();
                result.push((id, post.spec.series.unwrap().position));
            }
            result
        }
    }

    #[tokio::test]
    async fn test_append_uses_step() {
        let f = Fixture::new().await;
        let a = f.post("a").await;
        let b = f.post("b").await;

        assert_eq!(f.organizer.assign(&f.series, &a, None).await.unwrap(), 10);
        assert_eq!(f.organizer.assign(&f.series, &b, None).await.unwrap(), 20);
        assert_eq!(f.organizer.ordered(&f.series).await.unwrap(), vec![a, b]);
    }

    /// 测试：插入到10和20之间
    #[tokio::test]
    async fn test_insert_between() {
        let f = Fixture::new().await;
        let a = f.post("a").await;
        let b = f.post("b").await;
        let c = f.post("c").await;
        f.organizer.assign(&f.series, &a, None).await.unwrap();
        f.organizer.assign(&f.series, &b, None).await.unwrap();

        assert_eq!(f.organizer.assign(&f.series, &c, Some(15)).await.unwrap(), 15);
        let positions = f.positions().await;
        assert_eq!(positions, vec![(a, 10), (c, 15), (b, 20)]);
    }

    /// 测试：占用位置时局部重新编号
    #[tokio::test]
    async fn test_occupied_position_shifts_followers() {
        let f = Fixture::new().await;
        let a = f.post("a").await;
        let b = f.post("b").await;
        let c = f.post("c").await;
        f.organizer.assign(&f.series, &a, Some(10)).await.unwrap();
        f.organizer.assign(&f.series, &b, Some(11)).await.unwrap();

        assert_eq!(f.organizer.assign(&f.series, &c, Some(10)).await.unwrap(), 10);
        let positions = f.positions().await;
        assert_eq!(positions, vec![(c, 10), (a, 11), (b, 12)]);
    }

    #[tokio::test]
    async fn test_remove_keeps_positions() {
        let f = Fixture::new().await;
        let a = f.post("a").await;
        let b = f.post("b").await;
        let c = f.post("c").await;
        for id in [&a, &b, &c] {
            f.organizer.assign(&f.series, id, None).await.unwrap();
        }

        f.organizer.remove(&f.series, &b).await.unwrap();
        assert_eq!(f.positions().await, vec![(a.clone(), 10), (c.clone(), 30)]);

        let nav = f.organizer.navigation(&c).await.unwrap();
        assert_eq!(nav.previous, Some(a));
        assert_eq!(nav.next, None);
        assert_eq!(f.organizer.navigation(&b).await.unwrap(), SeriesNavigation::default());
    }

    #[tokio::test]
    async fn test_invalid_position() {
        let f = Fixture::new().await;
        let a = f.post("a").await;
        let err = f.organizer.assign(&f.series, &a, Some(0)).await.unwrap_err();
        assert!(matches!(err, ContentError::InvalidSeriesPosition(_)));

        let err = f.organizer.assign("missing", &a, None).await.unwrap_err();
        assert!(matches!(err, ContentError::NotFound { kind: "Series", .. }));
    }

    /// 测试：重新指定位置会移动文章
    #[tokio::test]
    async fn test_reassign_moves_post() {
        let f = Fixture::new().await;
        let a = f.post("a").await;
        let b = f.post("b").await;
        f.organizer.assign(&f.series, &a, None).await.unwrap();
        f.organizer.assign(&f.series, &b, None).await.unwrap();

        f.organizer.assign(&f.series, &a, Some(25)).await.unwrap();
        assert_eq!(f.positions().await, vec![(b, 20), (a, 25)]);
    }

    /// 测试：任意assign/remove序列后位置两两不同
    #[tokio::test]
    async fn test_positions_stay_distinct() {
        let f = Fixture::new().await;
        let mut posts = Vec::new();
        for i in 0..6 {
            posts.push(f.post(&format!("p{}", i)).await);
        }
        let script: [(usize, Option<u32>); 8] = [
            (0, None),
            (1, Some(10)),
            (2, Some(10)),
            (3, Some(11)),
            (4, None),
            (5, Some(1)),
            (0, Some(12)),
            (2, None),
        ];
        for (i, desired) in script {
            f.organizer.assign(&f.series, &posts[i], desired).await.unwrap();
            let positions: Vec<u32> = f.positions().await.into_iter().map(|(_, p)| p).collect();
            let distinct: HashSet<_> = positions.iter().collect();
            assert_eq!(distinct.len(), positions.len());
            assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
        f.organizer.remove(&f.series, &posts[3]).await.unwrap();
        assert_eq!(f.positions().await.len(), 5);
    }

    /// 测试：并发插入同一位置不会产生重复位置
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_assign() {
        let f = Arc::new(Fixture::new().await);
        let mut posts = Vec::new();
        for i in 0..5 {
            posts.push(f.post(&format!("c{}", i)).await);
        }

        let handles: Vec<_> = posts
            .iter()
            .cloned()
            .map(|id| {
                let f = f.clone();
                tokio::spawn(async move { f.organizer.assign(&f.series, &id, Some(10)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let positions: Vec<u32> = f.positions().await.into_iter().map(|(_, p)| p).collect();
        assert_eq!(positions.len(), 5);
        let distinct: HashSet<_> = positions.iter().collect();
        assert_eq!(distinct.len(), 5);
    }

    #[tokio::test]
    async fn test_series_slug_and_completion() {
        let f = Fixture::new().await;
        let other = f
            .organizer
            .create_series(SeriesRequest {
                title: "Learning Rust".to_string(),
                description: Some("again".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(other.spec.slug, "learning-rust-2");

        let done = f.organizer.set_completed(&f.series, true).await.unwrap();
        assert!(done.spec.completed);
        assert_eq!(done.metadata.version, Some(2));
    }
}

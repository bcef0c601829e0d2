use async_trait::async_trait;
use quill_api::extension::{Batch, ExtensionClient, ExtensionError, ListOptions, ListResult};
use quill_api::notification::NotifyEvent;
use quill_domain::content::post::tag_label;
use quill_domain::content::{constant, Category, Post, PostPhase, PostSpec, PostStatus, SeriesMembership};
use serde::{Deserialize, Serialize};
use chrono::Utc;
use crate::content::category_tree::{CategoryTree, DefaultCategoryTree};
use crate::content::reading_time::ReadingTimeEstimator;
use crate::content::series_organizer::DefaultSeriesOrganizer;
use crate::content::slug::{slug_candidate, slugify};
use crate::content::tag_registry::{DefaultTagRegistry, TagRegistry};
use crate::error::ContentError;
use crate::notification::NotificationDispatcher;
use crate::settings::ContentSettings;
use std::collections::HashMap;
use std::sync::Arc;

/// 发布文章的请求
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    pub title: String,
    pub body: String,
    pub author: String,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub series: Option<String>,
    pub desired_position: Option<u32>,
    pub excerpt: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

/// Post查询参数
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostQuery {
    pub phase: Option<PostPhase>,
    pub author: Option<String>,
    pub category: Option<String>,
    /// 标签名，按规范化名称匹配
    pub tag: Option<String>,
    pub featured: Option<bool>,
    #[serde(default)]
    pub sort: PostSort,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

/// 列表排序方式，`-` 前缀表示倒序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum PostSort {
    #[default]
    #[serde(rename = "-published_at")]
    PublishedDesc,
    #[serde(rename = "published_at")]
    PublishedAsc,
    #[serde(rename = "-views")]
    ViewsDesc,
    #[serde(rename = "views")]
    ViewsAsc,
    #[serde(rename = "title")]
    TitleAsc,
    #[serde(rename = "-title")]
    TitleDesc,
}

impl PostSort {
    /// 排序，主键相同时按发布时间倒序
    pub fn apply(self, posts: &mut [Post]) {
        sort_by_published_desc(posts);
        match self {
            PostSort::PublishedDesc => {}
            PostSort::PublishedAsc => posts.reverse(),
            PostSort::ViewsDesc => posts.sort_by(|a, b| b.status.views.cmp(&a.status.views)),
            PostSort::ViewsAsc => posts.sort_by_key(|p| p.status.views),
            PostSort::TitleAsc => posts.sort_by_cached_key(|p| p.spec.title.to_lowercase()),
            PostSort::TitleDesc => {
                posts.sort_by_cached_key(|p| std::cmp::Reverse(p.spec.title.to_lowercase()))
            }
        }
    }
}

impl PostQuery {
    /// 构建label_selector，`tag_id` 是已解析的标签ID
    fn label_selector(&self, tag_id: Option<&str>) -> Option<String> {
        let mut selectors = Vec::new();
        if let Some(phase) = self.phase {
            selectors.push(format!("{}={}", constant::POST_PHASE_LABEL, phase.as_str()));
        }
        if let Some(ref author) = self.author {
            selectors.push(format!("{}={}", constant::POST_OWNER_LABEL, author));
        }
        if let Some(ref category) = self.category {
            selectors.push(format!("{}={}", constant::POST_CATEGORY_LABEL, category));
        }
        if let Some(tag_id) = tag_id {
            selectors.push(format!("{}=true", tag_label(tag_id)));
        }
        if let Some(featured) = self.featured {
            selectors.push(format!("{}={}", constant::POST_FEATURED_LABEL, featured));
        }
        (!selectors.is_empty()).then(|| selectors.join(","))
    }
}

/// 点赞切换的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeOutcome {
    pub liked: bool,
    pub like_count: usize,
}

/// 分类及其下已发布文章数
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPostCount {
    pub category: Category,
    pub published_posts: usize,
}

/// Post存储trait
#[async_trait]
pub trait PostStore: Send + Sync {
    /// 发布文章
    async fn publish(&self, draft: PostDraft) -> Result<Post, ContentError>;

    /// 修改正文，重新计算阅读时间
    async fn edit_body(&self, post_id: &str, body: &str) -> Result<Post, ContentError>;

    /// 归档文章
    async fn archive(&self, post_id: &str) -> Result<Post, ContentError>;

    async fn get(&self, post_id: &str) -> Result<Option<Post>, ContentError>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>, ContentError>;

    /// 列出文章，默认按发布时间倒序
    async fn list(&self, query: PostQuery) -> Result<ListResult<Post>, ContentError>;

    /// 浏览数加一
    async fn record_view(&self, post_id: &str) -> Result<Post, ContentError>;

    /// 切换用户对文章的点赞
    async fn toggle_like(&self, post_id: &str, user: &str) -> Result<LikeOutcome, ContentError>;

    /// 同分类下的其他已发布文章
    async fn related(&self, post_id: &str, limit: usize) -> Result<Vec<Post>, ContentError>;

    /// 某年（某月）发布的文章
    async fn archive_index(&self, year: i32, month: Option<u32>) -> Result<Vec<Post>, ContentError>;

    /// 每个分类直接包含的已发布文章数
    async fn category_counts(&self) -> Result<Vec<CategoryPostCount>, ContentError>;
}

/// 默认Post存储实现
pub struct DefaultPostStore<C: ExtensionClient> {
    client: Arc<C>,
    tags: Arc<DefaultTagRegistry<C>>,
    categories: Arc<DefaultCategoryTree<C>>,
    series: Arc<DefaultSeriesOrganizer<C>>,
    estimator: ReadingTimeEstimator,
    notifications: NotificationDispatcher,
    settings: ContentSettings,
}

impl<C: ExtensionClient> DefaultPostStore<C> {
    pub fn new(
        client: Arc<C>,
        tags: Arc<DefaultTagRegistry<C>>,
        categories: Arc<DefaultCategoryTree<C>>,
        series: Arc<DefaultSeriesOrganizer<C>>,
        notifications: NotificationDispatcher,
        settings: ContentSettings,
    ) -> Self {
        Self {
            client,
            tags,
            categories,
            series,
            estimator: ReadingTimeEstimator::new(settings.words_per_minute),
            notifications,
            settings,
        }
    }

    async fn require(&self, post_id: &str) -> Result<Post, ContentError> {
        self.client
            .fetch::<Post>(post_id)
            .await?
            .ok_or_else(|| ContentError::not_found("Post", post_id))
    }

    /// 从第n个候选开始找到第一个未被占用的slug
    async fn next_free_slug(&self, base: &str, n: &mut u32) -> Result<String, ContentError> {
        while *n <= self.settings.slug_max_attempts {
            let candidate = slug_candidate(base, *n);
            let taken = self
                .client
                .fetch_by_unique_key::<Post>(constant::POST_SLUG_INDEX, &candidate)
                .await?
                .is_some();
            if !taken {
                return Ok(candidate);
            }
            *n += 1;
        }
        Err(ContentError::SlugExhausted {
            base: base.to_string(),
            attempts: self.settings.slug_max_attempts,
        })
    }

    /// 读取-修改-写回，版本冲突时重读重试
    async fn modify<F>(&self, post_id: &str, mutate: F) -> Result<Post, ContentError>
    where
        F: Fn(&mut Post) + Send + Sync,
    {
        let mut attempts = 0;
        loop {
            let mut post = self.require(post_id).await?;
            mutate(&mut post);
            post.sync_labels();
            match self.client.update(post).await {
                Ok(post) => return Ok(post),
                Err(ExtensionError::VersionMismatch { .. }) if attempts < self.settings.max_write_attempts => {
                    attempts += 1;
                    tracing::debug!("Post {} changed concurrently, retrying", post_id);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn list_sorted(&self, selector: String) -> Result<Vec<Post>, ContentError> {
        let mut posts = self
            .client
            .list::<Post>(ListOptions::with_label_selector(selector))
            .await?
            .items;
        sort_by_published_desc(&mut posts);
        Ok(posts)
    }
}

fn sort_by_published_desc(posts: &mut [Post]) {
    posts.sort_by(|a, b| {
        b.status
            .published_at
            .cmp(&a.status.published_at)
            .then_with(|| b.metadata.creation_timestamp.cmp(&a.metadata.creation_timestamp))
    });
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl<C: ExtensionClient> PostStore for DefaultPostStore<C> {
    async fn publish(&self, draft: PostDraft) -> Result<Post, ContentError> {
        let category = non_blank(draft.category.clone());
        let series = non_blank(draft.series.clone());
        if series.is_none() && draft.desired_position.is_some() {
            return Err(ContentError::InvalidSeriesPosition(
                "a position requires a series".to_string(),
            ));
        }
        if let Some(category) = category.as_deref() {
            self.categories.validate(category).await.map_err(|e| match e {
                ContentError::CategoryNotFound(_) | ContentError::CategoryDepthExceeded { .. } => {
                    ContentError::InvalidCategory(e.to_string())
                }
                other => other,
            })?;
        }

        let reading_time = self.estimator.estimate(&draft.body);
        let base = slugify(&draft.title);
        let mut n = 1;
        let mut attempts = 0;
        loop {
            let slug = self.next_free_slug(&base, &mut n).await?;
            let tag_plan = self.tags.plan_all(&draft.tags).await?;

            let now = Utc::now();
            let mut post = Post::new(PostSpec {
                title: draft.title.trim().to_string(),
                slug,
                body: draft.body.clone(),
                excerpt: non_blank(draft.excerpt.clone()),
                owner: draft.author.clone(),
                category: category.clone(),
                tags: tag_plan.names().collect(),
                series: None,
                featured: draft.featured,
            });
            post.status = PostStatus {
                phase: PostPhase::Published,
                published_at: Some(now),
                reading_time_minutes: reading_time,
                last_modify_time: Some(now),
                ..PostStatus::default()
            };

            let mut batch = Batch::new();
            for tag in &tag_plan.created {
                batch.create(tag)?;
            }
            if let Some(series) = series.as_deref() {
                let plan = self
                    .series
                    .plan_position(series, post.id(), draft.desired_position)
                    .await?;
                for member in &plan.shifted {
                    batch.update(member)?;
                }
                post.spec.series = Some(SeriesMembership::new(series, plan.position));
            }
            post.sync_labels();
            batch.create(&post)?;

            match self.client.apply(batch).await {
                Ok(committed) => {
                    committed.refresh(&mut post);
                    tracing::info!("Published post {} ({})", post.spec.slug, post.id());
                    self.notifications.dispatch(NotifyEvent::PostPublished {
                        post_name: post.id().to_string(),
                        slug: post.spec.slug.clone(),
                        title: post.spec.title.clone(),
                        owner: post.spec.owner.clone(),
                    });
                    return Ok(post);
                }
                Err(e) if e.conflict_index() == Some(constant::POST_SLUG_INDEX) => {
                    tracing::debug!("Slug {} was taken concurrently", post.spec.slug);
                    n += 1;
                }
                Err(e) if e.is_retryable() && attempts < self.settings.max_write_attempts => {
                    attempts += 1;
                    tracing::debug!("Publishing {} conflicted, re-planning: {}", post.spec.slug, e);
                }
                Err(e) if e.is_retryable() && series.is_some() => {
                    return Err(ContentError::InvalidSeriesPosition(e.to_string()))
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn edit_body(&self, post_id: &str, body: &str) -> Result<Post, ContentError> {
        let minutes = self.estimator.estimate(body);
        let post = self
            .modify(post_id, |post| {
                post.spec.body = body.to_string();
                post.status.reading_time_minutes = minutes;
                post.status.last_modify_time = Some(Utc::now());
            })
            .await?;
        tracing::info!("Edited body of post {}, reading time {} min", post_id, minutes);
        Ok(post)
    }

    async fn archive(&self, post_id: &str) -> Result<Post, ContentError> {
        let post = self
            .modify(post_id, |post| post.status.phase = PostPhase::Archived)
            .await?;
        tracing::info!("Archived post {}", post_id);
        Ok(post)
    }

    async fn get(&self, post_id: &str) -> Result<Option<Post>, ContentError> {
        Ok(self.client.fetch(post_id).await?)
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>, ContentError> {
        Ok(self
            .client
            .fetch_by_unique_key(constant::POST_SLUG_INDEX, slug)
            .await?)
    }

    async fn list(&self, query: PostQuery) -> Result<ListResult<Post>, ContentError> {
        let tag_id = match query.tag.as_deref() {
            Some(name) => match self.tags.find(name).await? {
                Some(tag) => Some(tag.id().to_string()),
                None => {
                    return Ok(ListResult::new(Vec::new(), 0, query.page.unwrap_or(0), query.size.unwrap_or(0)))
                }
            },
            None => None,
        };

        let options = ListOptions {
            label_selector: query.label_selector(tag_id.as_deref()),
            ..ListOptions::default()
        };
        let mut posts = self.client.list::<Post>(options).await?.items;
        query.sort.apply(&mut posts);

        let page = ListOptions {
            page: query.page,
            size: query.size,
            ..ListOptions::default()
        };
        Ok(ListResult::paginate(posts, &page))
    }

    async fn record_view(&self, post_id: &str) -> Result<Post, ContentError> {
        self.modify(post_id, |post| post.status.views += 1).await
    }

    async fn toggle_like(&self, post_id: &str, user: &str) -> Result<LikeOutcome, ContentError> {
        let post = self
            .modify(post_id, |post| {
                if !post.status.liked_by.remove(user) {
                    post.status.liked_by.insert(user.to_string());
                }
            })
            .await?;
        Ok(LikeOutcome {
            liked: post.status.liked_by.contains(user),
            like_count: post.like_count(),
        })
    }

    async fn related(&self, post_id: &str, limit: usize) -> Result<Vec<Post>, ContentError> {
        let post = self.require(post_id).await?;
        let Some(category) = post.spec.category.as_deref() else {
            return Ok(Vec::new());
        };
        let selector = format!(
            "{}={},{}={}",
            constant::POST_CATEGORY_LABEL,
            category,
            constant::POST_PHASE_LABEL,
            PostPhase::Published.as_str()
        );
        let mut posts = self.list_sorted(selector).await?;
        posts.retain(|p| p.id() != post_id);
        posts.truncate(limit);
        Ok(posts)
    }

    async fn archive_index(&self, year: i32, month: Option<u32>) -> Result<Vec<Post>, ContentError> {
        let mut selector = format!(
            "{}={},{}={}",
            constant::POST_PHASE_LABEL,
            PostPhase::Published.as_str(),
            constant::POST_ARCHIVE_YEAR_LABEL,
            year
        );
        if let Some(month) = month {
            selector.push_str(&format!(",{}={:02}", constant::POST_ARCHIVE_MONTH_LABEL, month));
        }
        self.list_sorted(selector).await
    }

    async fn category_counts(&self) -> Result<Vec<CategoryPostCount>, ContentError> {
        let selector = format!("{}={}", constant::POST_PHASE_LABEL, PostPhase::Published.as_str());
        let published = self
            .client
            .list::<Post>(ListOptions::with_label_selector(selector))
            .await?
            .items;

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for post in &published {
            if let Some(category) = post.spec.category.as_deref() {
                *counts.entry(category).or_default() += 1;
            }
        }

        let categories = self.categories.list().await?;
        Ok(categories
            .into_iter()
            .map(|category| {
                let published_posts = counts.get(category.id()).copied().unwrap_or(0);
                CategoryPostCount {
                    category,
                    published_posts,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::category_tree::CategoryRequest;
    use crate::content::series_organizer::{SeriesOrganizer, SeriesRequest};
    use crate::testing::{memory_client, recording_notifier, FailingNotifier, RecordedEvents};
    use quill_api::notification::Notifier;
    use quill_infra::ReactiveExtensionClient;
    use std::collections::HashSet;

    type Client = ReactiveExtensionClient;

    struct Fixture {
        store: Arc<DefaultPostStore<Client>>,
        tags: Arc<DefaultTagRegistry<Client>>,
        categories: Arc<DefaultCategoryTree<Client>>,
        series: Arc<DefaultSeriesOrganizer<Client>>,
    }

    fn fixture_with(notifier: Arc<dyn Notifier>) -> Fixture {
        let client = memory_client();
        let settings = ContentSettings::default();
        let tags = Arc::new(DefaultTagRegistry::new(client.clone(), &settings));
        let categories = Arc::new(DefaultCategoryTree::new(client.clone(), &settings));
        let series = Arc::new(DefaultSeriesOrganizer::new(client.clone(), &settings));
        let store = Arc::new(DefaultPostStore::new(
            client,
            tags.clone(),
            categories.clone(),
            series.clone(),
            NotificationDispatcher::new(notifier),
            settings,
        ));
        Fixture {
            store,
            tags,
            categories,
            series,
        }
    }

    fn fixture() -> (Fixture, RecordedEvents) {
        let (notifier, events) = recording_notifier();
        (fixture_with(notifier), events)
    }

    fn draft(title: &str) -> PostDraft {
        PostDraft {
            title: title.to_string(),
            body: "<p>Some words here</p>".to_string(),
            author: "alice".to_string(),
            ..PostDraft::default()
        }
    }

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    /// 测试：发布文章并通知
    #[tokio::test]
    async fn test_publish() {
        let (f, events) = fixture();
        let mut request = draft("Hello World");
        request.body = words(400);
        request.tags = vec!["Rust".to_string(), "rust ".to_string(), "Async".to_string()];

        let post = f.store.publish(request).await.unwrap();
        assert_eq!(post.spec.slug, "hello-world");
        assert_eq!(post.status.phase, PostPhase::Published);
        assert!(post.status.published_at.is_some());
        assert_eq!(post.status.reading_time_minutes, 2);
        assert_eq!(post.spec.tags.len(), 2);
        assert_eq!(post.metadata.version, Some(1));
        assert_eq!(f.tags.list().await.unwrap().len(), 2);

        match events.next().await {
            Some(NotifyEvent::PostPublished { slug, .. }) => assert_eq!(slug, "hello-world"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    /// 测试：重复标题的slug追加序号
    #[tokio::test]
    async fn test_slug_collision() {
        let (f, _events) = fixture();
        let first = f.store.publish(draft("Hello World")).await.unwrap();
        let second = f.store.publish(draft("Hello World")).await.unwrap();
        let third = f.store.publish(draft("hello   world!")).await.unwrap();
        assert_eq!(first.spec.slug, "hello-world");
        assert_eq!(second.spec.slug, "hello-world-2");
        assert_eq!(third.spec.slug, "hello-world-3");

        let found = f.store.get_by_slug("hello-world-2").await.unwrap().unwrap();
        assert_eq!(found.id(), second.id());
    }

    #[tokio::test]
    async fn test_slug_exhausted() {
        let (notifier, _events) = recording_notifier();
        let client = memory_client();
        let settings = ContentSettings {
            slug_max_attempts: 2,
            ..ContentSettings::default()
        };
        let store = DefaultPostStore::new(
            client.clone(),
            Arc::new(DefaultTagRegistry::new(client.clone(), &settings)),
            Arc::new(DefaultCategoryTree::new(client.clone(), &settings)),
            Arc::new(DefaultSeriesOrganizer::new(client, &settings)),
            NotificationDispatcher::new(notifier),
            settings,
        );
        store.publish(draft("Same")).await.unwrap();
        store.publish(draft("Same")).await.unwrap();
        let err = store.publish(draft("Same")).await.unwrap_err();
        assert!(matches!(err, ContentError::SlugExhausted { attempts: 2, .. }));
    }

    /// 测试：并发发布相同标题时slug互不相同
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_publish_unique_slugs() {
        let (f, _events) = fixture();
        let handles: Vec<_> = (0..6)
            .map(|_| {
                let store = f.store.clone();
                tokio::spawn(async move { store.publish(draft("Race")).await })
            })
            .collect();

        let mut slugs = HashSet::new();
        for handle in handles {
            slugs.insert(handle.await.unwrap().unwrap().spec.slug);
        }
        assert_eq!(slugs.len(), 6);
        assert!(slugs.contains("race"));
    }

    #[tokio::test]
    async fn test_invalid_category() {
        let (f, _events) = fixture();
        let mut request = draft("Categorised");
        request.category = Some("missing".to_string());
        let err = f.store.publish(request).await.unwrap_err();
        assert!(matches!(err, ContentError::InvalidCategory(_)));
        assert_eq!(f.store.list(PostQuery::default()).await.unwrap().total, 0);

        let tech = f
            .categories
            .create(CategoryRequest {
                name: "Tech".to_string(),
                parent: None,
                description: None,
            })
            .await
            .unwrap();
        let mut request = draft("Categorised");
        request.category = Some(tech.id().to_string());
        let post = f.store.publish(request).await.unwrap();
        assert_eq!(post.spec.category.as_deref(), Some(tech.id()));
    }

    /// 测试：发布时指定系列位置
    #[tokio::test]
    async fn test_publish_into_series() {
        let (f, _events) = fixture();
        let series = f
            .series
            .create_series(SeriesRequest {
                title: "Guide".to_string(),
                description: None,
            })
            .await
            .unwrap();

        let mut first = draft("Part one");
        first.series = Some(series.id().to_string());
        let first = f.store.publish(first).await.unwrap();
        assert_eq!(first.spec.series.as_ref().unwrap().position, 10);

        let mut second = draft("Part zero");
        second.series = Some(series.id().to_string());
        second.desired_position = Some(10);
        let second = f.store.publish(second).await.unwrap();
        assert_eq!(second.spec.series.as_ref().unwrap().position, 10);

        let ordered = f.series.ordered(series.id()).await.unwrap();
        assert_eq!(ordered, vec![second.id().to_string(), first.id().to_string()]);

        let mut orphan = draft("Orphan");
        orphan.desired_position = Some(3);
        let err = f.store.publish(orphan).await.unwrap_err();
        assert!(matches!(err, ContentError::InvalidSeriesPosition(_)));
    }

    /// 测试：修改正文不改变slug和发布时间
    #[tokio::test]
    async fn test_edit_body() {
        let (f, _events) = fixture();
        let post = f.store.publish(draft("Editable")).await.unwrap();
        assert_eq!(post.status.reading_time_minutes, 1);

        let edited = f.store.edit_body(post.id(), &words(1000)).await.unwrap();
        assert_eq!(edited.status.reading_time_minutes, 5);
        assert_eq!(edited.spec.slug, post.spec.slug);
        assert_eq!(edited.status.published_at, post.status.published_at);
        assert_eq!(edited.metadata.version, Some(2));

        let err = f.store.edit_body("missing", "x").await.unwrap_err();
        assert!(matches!(err, ContentError::NotFound { kind: "Post", .. }));
    }

    #[tokio::test]
    async fn test_archive_and_list() {
        let (f, _events) = fixture();
        let a = f.store.publish(draft("A")).await.unwrap();
        let mut featured = draft("B");
        featured.featured = true;
        featured.tags = vec!["News".to_string()];
        let b = f.store.publish(featured).await.unwrap();

        let archived = f.store.archive(a.id()).await.unwrap();
        assert_eq!(archived.status.phase, PostPhase::Archived);
        assert_eq!(archived.status.published_at, a.status.published_at);

        let published = f
            .store
            .list(PostQuery {
                phase: Some(PostPhase::Published),
                ..PostQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(published.total, 1);
        assert_eq!(published.items[0].id(), b.id());

        let by_tag = f
            .store
            .list(PostQuery {
                tag: Some("NEWS".to_string()),
                ..PostQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(by_tag.total, 1);

        let unknown_tag = f
            .store
            .list(PostQuery {
                tag: Some("nothing".to_string()),
                ..PostQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(unknown_tag.total, 0);

        let featured = f
            .store
            .list(PostQuery {
                featured: Some(true),
                author: Some("alice".to_string()),
                ..PostQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(featured.items.len(), 1);

        let all = f.store.list(PostQuery::default()).await.unwrap();
        assert_eq!(all.items[0].id(), b.id());
    }

    #[tokio::test]
    async fn test_views_and_likes() {
        let (f, _events) = fixture();
        let post = f.store.publish(draft("Popular")).await.unwrap();

        f.store.record_view(post.id()).await.unwrap();
        let viewed = f.store.record_view(post.id()).await.unwrap();
        assert_eq!(viewed.status.views, 2);

        let liked = f.store.toggle_like(post.id(), "bob").await.unwrap();
        assert_eq!(liked, LikeOutcome { liked: true, like_count: 1 });
        let unliked = f.store.toggle_like(post.id(), "bob").await.unwrap();
        assert_eq!(unliked, LikeOutcome { liked: false, like_count: 0 });
    }

    #[tokio::test]
    async fn test_related_and_archive_index() {
        let (f, _events) = fixture();
        let tech = f
            .categories
            .create(CategoryRequest {
                name: "Tech".to_string(),
                parent: None,
                description: None,
            })
            .await
            .unwrap();
        let mut ids = Vec::new();
        for title in ["One", "Two", "Three"] {
            let mut request = draft(title);
            request.category = Some(tech.id().to_string());
            ids.push(f.store.publish(request).await.unwrap());
        }
        f.store.publish(draft("Uncategorised")).await.unwrap();

        let related = f.store.related(ids[0].id(), 5).await.unwrap();
        assert_eq!(related.len(), 2);
        assert!(related.iter().all(|p| p.id() != ids[0].id()));
        assert_eq!(f.store.related(ids[0].id(), 1).await.unwrap().len(), 1);

        let now = Utc::now();
        use chrono::Datelike;
        let this_month = f.store.archive_index(now.year(), Some(now.month())).await.unwrap();
        assert_eq!(this_month.len(), 4);
        assert!(f.store.archive_index(now.year() - 1, None).await.unwrap().is_empty());
    }

    /// 测试：按浏览数和标题排序
    #[tokio::test]
    async fn test_list_sort() {
        let (f, _events) = fixture();
        let quiet = f.store.publish(draft("banana")).await.unwrap();
        let popular = f.store.publish(draft("Apple")).await.unwrap();
        let middling = f.store.publish(draft("cherry")).await.unwrap();
        for _ in 0..3 {
            f.store.record_view(popular.id()).await.unwrap();
        }
        f.store.record_view(middling.id()).await.unwrap();

        let sorted = |sort: PostSort| {
            let store = f.store.clone();
            async move {
                store
                    .list(PostQuery {
                        sort,
                        ..PostQuery::default()
                    })
                    .await
                    .unwrap()
                    .items
                    .iter()
                    .map(|p| p.id().to_string())
                    .collect::<Vec<_>>()
            }
        };

        let ids = |posts: &[&Post]| posts.iter().map(|p| p.id().to_string()).collect::<Vec<_>>();
        assert_eq!(sorted(PostSort::ViewsDesc).await, ids(&[&popular, &middling, &quiet]));
        assert_eq!(sorted(PostSort::ViewsAsc).await, ids(&[&quiet, &middling, &popular]));
        assert_eq!(sorted(PostSort::TitleAsc).await, ids(&[&popular, &quiet, &middling]));
        assert_eq!(sorted(PostSort::TitleDesc).await, ids(&[&middling, &quiet, &popular]));

        let newest_first = sorted(PostSort::PublishedDesc).await;
        let mut oldest_first = sorted(PostSort::PublishedAsc).await;
        oldest_first.reverse();
        assert_eq!(newest_first, oldest_first);

        let top = f
            .store
            .list(PostQuery {
                sort: PostSort::ViewsDesc,
                size: Some(1),
                ..PostQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(top.total, 3);
        assert_eq!(top.items[0].id(), popular.id());
    }

    #[test]
    fn test_sort_from_query_value() {
        let query: PostQuery = serde_json::from_value(serde_json::json!({ "sort": "-views" })).unwrap();
        assert_eq!(query.sort, PostSort::ViewsDesc);
        let query: PostQuery = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(query.sort, PostSort::PublishedDesc);
        assert!(serde_json::from_value::<PostQuery>(serde_json::json!({ "sort": "likes" })).is_err());
    }

    /// 测试：分类下只统计已发布文章
    #[tokio::test]
    async fn test_category_counts() {
        let (f, _events) = fixture();
        let mut created = Vec::new();
        for name in ["Tech", "Life"] {
            created.push(
                f.categories
                    .create(CategoryRequest {
                        name: name.to_string(),
                        parent: None,
                        description: None,
                    })
                    .await
                    .unwrap(),
            );
        }
        let (tech, life) = (&created[0], &created[1]);

        for title in ["One", "Two", "Three"] {
            let mut request = draft(title);
            request.category = Some(tech.id().to_string());
            f.store.publish(request).await.unwrap();
        }
        let mut request = draft("Old news");
        request.category = Some(tech.id().to_string());
        let old = f.store.publish(request).await.unwrap();
        f.store.archive(old.id()).await.unwrap();
        f.store.publish(draft("Loose")).await.unwrap();

        let counts = f.store.category_counts().await.unwrap();
        assert_eq!(counts.len(), 2);
        let count_of = |id: &str| {
            counts
                .iter()
                .find(|c| c.category.id() == id)
                .map(|c| c.published_posts)
        };
        assert_eq!(count_of(tech.id()), Some(3));
        assert_eq!(count_of(life.id()), Some(0));
    }

    /// 测试：通知失败不影响发布
    #[tokio::test]
    async fn test_notifier_failure_does_not_roll_back() {
        let f = fixture_with(Arc::new(FailingNotifier));
        let post = f.store.publish(draft("Quiet")).await.unwrap();
        tokio::task::yield_now().await;
        assert!(f.store.get(post.id()).await.unwrap().is_some());
    }
}

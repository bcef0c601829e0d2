use quill_api::extension::ExtensionClient;
use quill_api::notification::Notifier;
use quill_service::{
    CategoryTree, CommentThreadManager, ContentSettings, DefaultCategoryTree,
    DefaultCommentThreadManager, DefaultPostStore, DefaultSeriesOrganizer,
    DefaultSubscriptionManager, DefaultTagRegistry, NotificationDispatcher, PostStore,
    SeriesOrganizer, SubscriptionManager, TagRegistry,
};
use std::sync::Arc;

/// 应用状态
/// 包含所有需要的服务实例
#[derive(Clone)]
pub struct AppState {
    pub post_store: Arc<dyn PostStore>,
    pub tag_registry: Arc<dyn TagRegistry>,
    pub category_tree: Arc<dyn CategoryTree>,
    pub series_organizer: Arc<dyn SeriesOrganizer>,
    pub comment_manager: Arc<dyn CommentThreadManager>,
    pub subscription_manager: Arc<dyn SubscriptionManager>,
}

impl AppState {
    /// 在同一个ExtensionClient上组装全部服务
    pub fn new<C>(client: Arc<C>, notifier: Arc<dyn Notifier>, settings: ContentSettings) -> Self
    where
        C: ExtensionClient + 'static,
    {
        let notifications = NotificationDispatcher::new(notifier);

        // PostStore需要具体类型来把标签和系列成员并入同一批写入
        let tags = Arc::new(DefaultTagRegistry::new(client.clone(), &settings));
        let categories = Arc::new(DefaultCategoryTree::new(client.clone(), &settings));
        let series = Arc::new(DefaultSeriesOrganizer::new(client.clone(), &settings));

        let post_store = DefaultPostStore::new(
            client.clone(),
            tags.clone(),
            categories.clone(),
            series.clone(),
            notifications.clone(),
            settings.clone(),
        );

        Self {
            post_store: Arc::new(post_store),
            tag_registry: tags,
            category_tree: categories,
            series_organizer: series,
            comment_manager: Arc::new(DefaultCommentThreadManager::new(client.clone(), &settings)),
            subscription_manager: Arc::new(DefaultSubscriptionManager::new(client, notifications, &settings)),
        }
    }
}

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use quill_infra::{
    DatabaseManager, ExtensionRepository, LoggingNotifier, MemoryExtensionRepository,
    ReactiveExtensionClient, SeaOrmExtensionRepository,
};
use quill_migration::{Migrator, MigratorTrait};
use quill_web::AppState;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::config::Config;
use crate::error::Result;

/// 创建路由
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1alpha1/health", get(health_check))
        // Post
        .route("/api/v1alpha1/posts", get(quill_web::list_posts).post(quill_web::publish_post))
        .route("/api/v1alpha1/posts/-/slug/:slug", get(quill_web::get_post_by_slug))
        .route("/api/v1alpha1/posts/-/archive", get(quill_web::archive_index))
        .route("/api/v1alpha1/posts/:id", get(quill_web::get_post))
        .route("/api/v1alpha1/posts/:id/body", put(quill_web::edit_post_body))
        .route("/api/v1alpha1/posts/:id/archive", put(quill_web::archive_post))
        .route("/api/v1alpha1/posts/:id/views", put(quill_web::record_post_view))
        .route("/api/v1alpha1/posts/:id/likes", put(quill_web::toggle_post_like))
        .route("/api/v1alpha1/posts/:id/related", get(quill_web::related_posts))
        .route("/api/v1alpha1/posts/:id/navigation", get(quill_web::post_navigation))
        .route("/api/v1alpha1/posts/:id/comments", get(quill_web::list_post_comments).post(quill_web::submit_comment))
        // Tag
        .route("/api/v1alpha1/tags", get(quill_web::list_tags))
        .route("/api/v1alpha1/tags/-/resolve", post(quill_web::resolve_tags))
        // Category
        .route("/api/v1alpha1/categories", get(quill_web::list_categories).post(quill_web::create_category))
        .route("/api/v1alpha1/categories/-/post-counts", get(quill_web::category_post_counts))
        .route("/api/v1alpha1/categories/:id", get(quill_web::get_category))
        .route("/api/v1alpha1/categories/:id/path", get(quill_web::category_path))
        .route("/api/v1alpha1/categories/:id/parent", put(quill_web::move_category))
        // Series
        .route("/api/v1alpha1/series", post(quill_web::create_series))
        .route("/api/v1alpha1/series/:id", get(quill_web::get_series))
        .route("/api/v1alpha1/series/:id/posts", get(quill_web::series_posts))
        .route("/api/v1alpha1/series/:id/completed", put(quill_web::complete_series))
        // Comment
        .route("/api/v1alpha1/comments/-/pending", get(quill_web::pending_comments))
        .route("/api/v1alpha1/comments/:id", get(quill_web::get_comment).delete(quill_web::delete_comment))
        .route("/api/v1alpha1/comments/:id/moderation", put(quill_web::moderate_comment))
        // Subscriber
        .route("/api/v1alpha1/subscribers", post(quill_web::subscribe))
        .route("/api/v1alpha1/subscribers/-/confirm", post(quill_web::confirm_subscription))
        .route("/api/v1alpha1/subscribers/-/unsubscribe", post(quill_web::unsubscribe))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// 健康检查端点
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// 根据配置选择存储：配置了数据库时连接并执行迁移，否则使用内存存储
pub async fn init_repository(config: &Config) -> Result<Arc<dyn ExtensionRepository>> {
    match &config.database {
        Some(database) => {
            let manager = DatabaseManager::connect(
                &database.url,
                database.max_connections,
                database.min_connections,
            )
            .await?;
            let connection = manager.connection();
            Migrator::up(connection.as_ref(), None).await?;
            info!("Database connected and migrated");
            Ok(Arc::new(SeaOrmExtensionRepository::new(connection)))
        }
        None => {
            info!("No database configured, using in-memory storage");
            Ok(Arc::new(MemoryExtensionRepository::new()))
        }
    }
}

/// 初始化应用状态
pub fn init_app_state(repository: Arc<dyn ExtensionRepository>, config: &Config) -> AppState {
    let extension_client = Arc::new(ReactiveExtensionClient::new(repository));
    AppState::new(extension_client, Arc::new(LoggingNotifier), config.content.clone())
}

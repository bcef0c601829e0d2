mod config;
mod error;
mod server;

use axum::serve;
use crate::config::Config;
use crate::error::{QuillError, Result};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置（日志级别也来自配置）
    let config = Config::load()?;

    // 初始化日志，RUST_LOG优先于配置
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let installed = if config.logging.json {
        tracing::subscriber::set_global_default(
            FmtSubscriber::builder().with_env_filter(filter).json().finish(),
        )
    } else {
        tracing::subscriber::set_global_default(
            FmtSubscriber::builder().with_env_filter(filter).finish(),
        )
    };
    installed.map_err(|e| QuillError::Internal(format!("Failed to set tracing subscriber: {}", e)))?;

    info!("Starting Quill application...");

    // 初始化存储
    let repository = server::init_repository(&config).await?;
    let app_state = server::init_app_state(repository, &config);
    info!("Application state initialized");

    // 创建路由
    let app = server::create_router(app_state);

    // 启动HTTP服务器
    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    serve(listener, app.into_make_service()).await?;

    Ok(())
}

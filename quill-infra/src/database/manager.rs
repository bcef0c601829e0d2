use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::sync::Arc;
use std::time::Duration;

/// DatabaseManager 管理数据库连接
#[derive(Clone)]
pub struct DatabaseManager {
    connection: Arc<DatabaseConnection>,
}

impl DatabaseManager {
    /// 连接数据库，url的scheme决定使用MySQL、PostgreSQL还是SQLite
    pub async fn connect(url: &str, max_connections: u32, min_connections: u32) -> Result<Self, DbErr> {
        let mut options = ConnectOptions::new(url.to_owned());
        options
            .max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(8))
            .sqlx_logging(false);

        let connection = Database::connect(options).await?;
        tracing::info!("Connected to database");

        Ok(Self {
            connection: Arc::new(connection),
        })
    }

    /// 获取数据库连接
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        self.connection.clone()
    }
}

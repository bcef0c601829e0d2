pub mod database;
pub mod extension;
pub mod notification;

pub use database::{DatabaseManager, ExtensionRepository, MemoryExtensionRepository, SeaOrmExtensionRepository};
pub use extension::ReactiveExtensionClient;
pub use notification::LoggingNotifier;

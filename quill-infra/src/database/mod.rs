pub mod extension_store;
pub mod manager;
pub mod memory;
pub mod repository;
pub mod unique_key;


pub use manager::DatabaseManager;
pub use memory::MemoryExtensionRepository;
pub use repository::{ExtensionRepository, SeaOrmExtensionRepository};

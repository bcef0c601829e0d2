pub mod app_state;
pub mod error;
pub mod handlers;

pub use app_state::AppState;
pub use error::ApiError;
pub use handlers::*;

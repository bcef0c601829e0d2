pub mod categories;
pub mod comments;
pub mod posts;
pub mod series;
pub mod subscribers;
pub mod tags;

pub use categories::*;
pub use comments::*;
pub use posts::*;
pub use series::*;
pub use subscribers::*;
pub use tags::*;

pub mod category_tree;
pub mod comment_thread;
pub mod post_store;
pub mod reading_time;
pub mod series_organizer;
pub mod slug;
pub mod tag_registry;

pub use category_tree::{CategoryTree, DefaultCategoryTree, CategoryRequest};
pub use comment_thread::{CommentThreadManager, DefaultCommentThreadManager, CommentRequest, CommentNode};
pub use post_store::{PostStore, DefaultPostStore, PostDraft, PostQuery, PostSort, LikeOutcome, CategoryPostCount};
pub use reading_time::ReadingTimeEstimator;
pub use series_organizer::{SeriesOrganizer, DefaultSeriesOrganizer, SeriesRequest, SeriesNavigation};
pub use slug::slugify;
pub use tag_registry::{TagRegistry, DefaultTagRegistry};

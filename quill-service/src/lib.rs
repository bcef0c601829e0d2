pub mod content;
pub mod error;
pub mod newsletter;
pub mod notification;
pub mod settings;

#[cfg(test)]
pub(crate) mod testing;

pub use error::ContentError;
pub use settings::ContentSettings;
pub use notification::NotificationDispatcher;

pub use content::{
    PostStore, DefaultPostStore, PostDraft, PostQuery, PostSort, LikeOutcome, CategoryPostCount,
    TagRegistry, DefaultTagRegistry,
    CategoryTree, DefaultCategoryTree, CategoryRequest,
    SeriesOrganizer, DefaultSeriesOrganizer, SeriesRequest, SeriesNavigation,
    CommentThreadManager, DefaultCommentThreadManager, CommentRequest, CommentNode,
    ReadingTimeEstimator,
    slugify,
};

pub use newsletter::{SubscriptionManager, DefaultSubscriptionManager};

pub mod content;
pub mod newsletter;

pub use content::{
    Post, PostSpec, PostStatus, PostPhase, SeriesMembership,
    Tag, TagSpec,
    Category, CategorySpec,
    Series, SeriesSpec,
    Comment, CommentSpec, CommentStatus, CommentPhase, ModerationDecision,
};

pub use newsletter::{Subscriber, SubscriberSpec, SubscriberStatus, SubscriberPhase, ConfirmationToken, normalize_email, is_valid_email};

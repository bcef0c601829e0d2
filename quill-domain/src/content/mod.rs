pub mod post;
pub mod tag;
pub mod category;
pub mod series;
pub mod comment;

pub use post::{Post, PostSpec, PostStatus, PostPhase, SeriesMembership};
pub use tag::{Tag, TagSpec, normalize_name};
pub use category::{Category, CategorySpec};
pub use series::{Series, SeriesSpec};
pub use comment::{Comment, CommentSpec, CommentStatus, CommentPhase, ModerationDecision};

/// 内容管理相关的常量
pub mod constant {
    pub const GROUP: &str = "content.quill.run";
    pub const VERSION: &str = "v1alpha1";

    // Post相关
    pub const POST_KIND: &str = "Post";
    pub const POST_OWNER_LABEL: &str = "content.quill.run/owner";
    pub const POST_PHASE_LABEL: &str = "content.quill.run/phase";
    pub const POST_CATEGORY_LABEL: &str = "content.quill.run/category";
    pub const POST_SERIES_LABEL: &str = "content.quill.run/series";
    pub const POST_FEATURED_LABEL: &str = "content.quill.run/featured";
    pub const POST_ARCHIVE_YEAR_LABEL: &str = "content.quill.run/archive-year";
    pub const POST_ARCHIVE_MONTH_LABEL: &str = "content.quill.run/archive-month";
    /// 每个标签对应一个 `tag.content.quill.run/{tagName}=true` 标签
    pub const POST_TAG_LABEL_PREFIX: &str = "tag.content.quill.run/";
    pub const POST_SLUG_INDEX: &str = "post.spec.slug";
    pub const POST_SERIES_POSITION_INDEX: &str = "post.spec.seriesPosition";

    // Tag相关
    pub const TAG_KIND: &str = "Tag";
    pub const TAG_NAME_INDEX: &str = "tag.spec.normalizedName";

    // Category相关
    pub const CATEGORY_KIND: &str = "Category";
    pub const CATEGORY_PARENT_LABEL: &str = "content.quill.run/parent-category";
    pub const CATEGORY_NAME_INDEX: &str = "category.spec.normalizedName";

    // Series相关
    pub const SERIES_KIND: &str = "Series";
    pub const SERIES_SLUG_INDEX: &str = "series.spec.slug";

    // Comment相关
    pub const COMMENT_KIND: &str = "Comment";
    pub const COMMENT_POST_LABEL: &str = "content.quill.run/post";
    pub const COMMENT_PARENT_LABEL: &str = "content.quill.run/parent";
    pub const COMMENT_PHASE_LABEL: &str = "content.quill.run/comment-phase";
    pub const COMMENT_POST_OWNER_LABEL: &str = "content.quill.run/post-owner";
}

use quill_api::extension::{Extension, GroupVersionKind, Metadata, UniqueKey};
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Datelike, Utc};
use std::collections::BTreeSet;
use super::constant;

/// Post实体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub metadata: Metadata,
    pub spec: PostSpec,
    #[serde(default)]
    pub status: PostStatus,
}

impl Extension for Post {
    fn gvk() -> GroupVersionKind {
        GroupVersionKind::new(constant::GROUP, constant::VERSION, constant::POST_KIND)
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        let mut keys = vec![UniqueKey::new(constant::POST_SLUG_INDEX, &self.spec.slug)];
        if let Some(membership) = &self.spec.series {
            keys.push(UniqueKey::new(
                constant::POST_SERIES_POSITION_INDEX,
                membership.index_value(),
            ));
        }
        keys
    }
}

impl Post {
    pub fn new(spec: PostSpec) -> Self {
        let mut post = Self {
            metadata: Metadata::generate(),
            spec,
            status: PostStatus::default(),
        };
        post.sync_labels();
        post
    }

    pub fn id(&self) -> &str {
        &self.metadata.name
    }

    /// 检查文章是否已发布
    pub fn is_published(&self) -> bool {
        self.status.phase == PostPhase::Published
    }

    pub fn is_archived(&self) -> bool {
        self.status.phase == PostPhase::Archived
    }

    pub fn like_count(&self) -> usize {
        self.status.liked_by.len()
    }

    /// 根据spec和status重新计算查询用的标签
    ///
    /// 每次修改文章后、写入存储前都必须调用。
    pub fn sync_labels(&mut self) {
        let owner = self.spec.owner.clone();
        let phase = self.status.phase;
        let category = self.spec.category.clone();
        let series = self.spec.series.as_ref().map(|m| m.series.clone());
        let featured = self.spec.featured;
        let published_at = self.status.published_at;
        let tags = self.spec.tags.clone();

        let metadata = &mut self.metadata;
        metadata.set_label(constant::POST_OWNER_LABEL, owner);
        metadata.set_label(constant::POST_PHASE_LABEL, phase.as_str());
        metadata.set_label(constant::POST_FEATURED_LABEL, featured.to_string());

        match category {
            Some(category) => metadata.set_label(constant::POST_CATEGORY_LABEL, category),
            None => metadata.remove_label(constant::POST_CATEGORY_LABEL),
        }
        match series {
            Some(series) => metadata.set_label(constant::POST_SERIES_LABEL, series),
            None => metadata.remove_label(constant::POST_SERIES_LABEL),
        }
        match published_at {
            Some(at) => {
                metadata.set_label(constant::POST_ARCHIVE_YEAR_LABEL, at.year().to_string());
                metadata.set_label(constant::POST_ARCHIVE_MONTH_LABEL, format!("{:02}", at.month()));
            }
            None => {
                metadata.remove_label(constant::POST_ARCHIVE_YEAR_LABEL);
                metadata.remove_label(constant::POST_ARCHIVE_MONTH_LABEL);
            }
        }

        metadata.remove_labels_with_prefix(constant::POST_TAG_LABEL_PREFIX);
        for tag in tags {
            metadata.set_label(tag_label(&tag), "true");
        }
    }
}

/// 文章对应某个标签的label键
pub fn tag_label(tag_name: &str) -> String {
    format!("{}{}", constant::POST_TAG_LABEL_PREFIX, tag_name)
}

/// PostSpec包含文章的规格信息
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSpec {
    pub title: String,

    pub slug: String,

    /// 已清洗过的富文本内容
    pub body: String,

    pub excerpt: Option<String>,

    pub owner: String,

    pub category: Option<String>,

    /// Tag的metadata.name集合
    #[serde(default)]
    pub tags: BTreeSet<String>,

    pub series: Option<SeriesMembership>,

    #[serde(default)]
    pub featured: bool,
}

/// 文章在系列中的位置，series和position总是同时存在
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesMembership {
    pub series: String,
    pub position: u32,
}

impl SeriesMembership {
    pub fn new(series: impl Into<String>, position: u32) -> Self {
        Self {
            series: series.into(),
            position,
        }
    }

    /// 唯一索引值: {series}#{position}
    pub fn index_value(&self) -> String {
        format!("{}#{}", self.series, self.position)
    }
}

/// PostStatus包含文章的状态信息
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PostStatus {
    pub phase: PostPhase,

    /// 首次发布时间，设置后不再改变
    pub published_at: Option<DateTime<Utc>>,

    pub reading_time_minutes: u32,

    #[serde(default)]
    pub views: u64,

    #[serde(default)]
    pub liked_by: BTreeSet<String>,

    pub last_modify_time: Option<DateTime<Utc>>,
}

/// PostPhase表示文章的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostPhase {
    #[default]
    Draft,
    Published,
    Archived,
}

impl PostPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostPhase::Draft => "DRAFT",
            PostPhase::Published => "PUBLISHED",
            PostPhase::Archived => "ARCHIVED",
        }
    }
}

impl std::str::FromStr for PostPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DRAFT" => Ok(PostPhase::Draft),
            "PUBLISHED" => Ok(PostPhase::Published),
            "ARCHIVED" => Ok(PostPhase::Archived),
            other => Err(format!("unknown post phase: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn spec() -> PostSpec {
        PostSpec {
            title: "Hello World".to_string(),
            slug: "hello-world".to_string(),
            body: "<p>hi</p>".to_string(),
            excerpt: None,
            owner: "alice".to_string(),
            category: Some("rust".to_string()),
            tags: ["t1".to_string(), "t2".to_string()].into_iter().collect(),
            series: None,
            featured: false,
        }
    }

    /// 测试：标签同步
    #[test]
    fn test_sync_labels() {
        let mut post = Post::new(spec());
        assert_eq!(post.metadata.label(constant::POST_OWNER_LABEL), Some("alice"));
        assert_eq!(post.metadata.label(constant::POST_PHASE_LABEL), Some("DRAFT"));
        assert_eq!(post.metadata.label(constant::POST_CATEGORY_LABEL), Some("rust"));
        assert_eq!(post.metadata.label(&tag_label("t1")), Some("true"));
        assert!(post.metadata.label(constant::POST_ARCHIVE_YEAR_LABEL).is_none());

        post.spec.tags.remove("t1");
        post.spec.category = None;
        post.status.phase = PostPhase::Published;
        post.status.published_at = Some(Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap());
        post.sync_labels();

        assert!(post.metadata.label(&tag_label("t1")).is_none());
        assert_eq!(post.metadata.label(&tag_label("t2")), Some("true"));
        assert!(post.metadata.label(constant::POST_CATEGORY_LABEL).is_none());
        assert_eq!(post.metadata.label(constant::POST_PHASE_LABEL), Some("PUBLISHED"));
        assert_eq!(post.metadata.label(constant::POST_ARCHIVE_YEAR_LABEL), Some("2024"));
        assert_eq!(post.metadata.label(constant::POST_ARCHIVE_MONTH_LABEL), Some("03"));
    }

    /// 测试：唯一索引键
    #[test]
    fn test_unique_keys() {
        let mut post = Post::new(spec());
        assert_eq!(post.unique_keys(), vec![UniqueKey::new(constant::POST_SLUG_INDEX, "hello-world")]);

        post.spec.series = Some(SeriesMembership::new("s1", 20));
        let keys = post.unique_keys();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[1].value, "s1#20");
    }

    #[test]
    fn test_phase_from_str() {
        assert_eq!("published".parse::<PostPhase>(), Ok(PostPhase::Published));
        assert!("removed".parse::<PostPhase>().is_err());
    }
}

use quill_api::extension::{Extension, GroupVersionKind, Metadata};
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use super::constant;

/// Comment实体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub metadata: Metadata,
    pub spec: CommentSpec,
    #[serde(default)]
    pub status: CommentStatus,
}

impl Extension for Comment {
    fn gvk() -> GroupVersionKind {
        GroupVersionKind::new(constant::GROUP, constant::VERSION, constant::COMMENT_KIND)
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

impl Comment {
    pub fn new(spec: CommentSpec, post_owner: &str) -> Self {
        let mut comment = Self {
            metadata: Metadata::generate(),
            spec,
            status: CommentStatus::default(),
        };
        comment.metadata.set_label(constant::COMMENT_POST_OWNER_LABEL, post_owner);
        comment.sync_labels();
        comment
    }

    pub fn id(&self) -> &str {
        &self.metadata.name
    }

    pub fn parent(&self) -> Option<&str> {
        self.spec.parent.as_deref()
    }

    pub fn phase(&self) -> CommentPhase {
        self.status.phase
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.metadata.creation_timestamp
    }

    pub fn sync_labels(&mut self) {
        let post = self.spec.post.clone();
        let phase = self.status.phase;
        let parent = self.spec.parent.clone();

        self.metadata.set_label(constant::COMMENT_POST_LABEL, post);
        self.metadata.set_label(constant::COMMENT_PHASE_LABEL, phase.as_str());
        match parent {
            Some(parent) => self.metadata.set_label(constant::COMMENT_PARENT_LABEL, parent),
            None => self.metadata.remove_label(constant::COMMENT_PARENT_LABEL),
        }
    }
}

/// CommentSpec包含评论的规格信息
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSpec {
    /// 所属文章的metadata.name
    pub post: String,
    /// 父评论，为空表示顶层评论
    pub parent: Option<String>,
    pub author: String,
    pub body: String,
}

/// CommentStatus包含评论的审核状态
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommentStatus {
    pub phase: CommentPhase,
    pub moderated_at: Option<DateTime<Utc>>,
}

/// 评论审核状态，PENDING之外的状态均为终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommentPhase {
    #[default]
    Pending,
    Approved,
    Rejected,
    Spam,
}

impl CommentPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentPhase::Pending => "PENDING",
            CommentPhase::Approved => "APPROVED",
            CommentPhase::Rejected => "REJECTED",
            CommentPhase::Spam => "SPAM",
        }
    }

    /// 待审核或已通过的评论仍可作为回复的父评论
    pub fn is_live(&self) -> bool {
        matches!(self, CommentPhase::Pending | CommentPhase::Approved)
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, CommentPhase::Pending)
    }
}

/// 审核决定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModerationDecision {
    Approve,
    Reject,
    Spam,
}

impl From<ModerationDecision> for CommentPhase {
    fn from(decision: ModerationDecision) -> Self {
        match decision {
            ModerationDecision::Approve => CommentPhase::Approved,
            ModerationDecision::Reject => CommentPhase::Rejected,
            ModerationDecision::Spam => CommentPhase::Spam,
        }
    }
}

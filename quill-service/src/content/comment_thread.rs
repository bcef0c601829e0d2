use async_trait::async_trait;
use quill_api::extension::{Batch, ExtensionClient, ExtensionError, ListOptions};
use quill_domain::content::{constant, Comment, CommentPhase, CommentSpec, ModerationDecision, Post};
use serde::{Deserialize, Serialize};
use chrono::Utc;
use crate::error::ContentError;
use crate::settings::ContentSettings;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// 提交评论的请求
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    pub post: String,
    pub parent: Option<String>,
    pub author: String,
    pub body: String,
}

/// 评论树中的节点
#[derive(Debug, Clone, Serialize)]
pub struct CommentNode {
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}

/// 评论线程管理trait
#[async_trait]
pub trait CommentThreadManager: Send + Sync {
    /// 提交评论，超过深度上限的回复挂到允许的最近祖先下
    async fn submit(&self, request: CommentRequest) -> Result<Comment, ContentError>;

    /// 审核待审核的评论
    async fn moderate(&self, comment_id: &str, decision: ModerationDecision) -> Result<Comment, ContentError>;

    /// 已通过审核的评论树
    async fn thread_of(&self, post_id: &str) -> Result<Vec<CommentNode>, ContentError>;

    /// 作者名下文章的待审核评论，按时间先后
    async fn pending_queue_for(&self, author: &str) -> Result<Vec<Comment>, ContentError>;

    /// 删除评论，直接回复改挂到它的父评论下
    async fn delete(&self, comment_id: &str) -> Result<(), ContentError>;

    async fn get(&self, comment_id: &str) -> Result<Option<Comment>, ContentError>;

    async fn approved_count(&self, post_id: &str) -> Result<u64, ContentError>;
}

pub struct DefaultCommentThreadManager<C: ExtensionClient> {
    client: Arc<C>,
    max_depth: usize,
    max_write_attempts: u32,
}

impl<C: ExtensionClient> DefaultCommentThreadManager<C> {
    pub fn new(client: Arc<C>, settings: &ContentSettings) -> Self {
        Self {
            client,
            max_depth: settings.max_comment_depth.max(1),
            max_write_attempts: settings.max_write_attempts,
        }
    }

    async fn require(&self, comment_id: &str) -> Result<Comment, ContentError> {
        self.client
            .fetch::<Comment>(comment_id)
            .await?
            .ok_or_else(|| ContentError::not_found("Comment", comment_id))
    }

    async fn comments_of(&self, selector: String) -> Result<Vec<Comment>, ContentError> {
        let mut comments = self
            .client
            .list::<Comment>(ListOptions::with_label_selector(selector))
            .await?
            .items;
        sort_by_creation(&mut comments);
        Ok(comments)
    }

    /// 请求的父评论实际应挂到哪条评论下，`None` 表示顶层
    async fn effective_parent(&self, post_id: &str, parent_id: &str) -> Result<Option<String>, ContentError> {
        let parent = self.require(parent_id).await?;
        if parent.spec.post != post_id {
            return Err(ContentError::CrossPostReply {
                parent: parent_id.to_string(),
                post: post_id.to_string(),
            });
        }

        // 从父评论向上收集祖先，缺失的祖先视为已到顶层
        let mut visited = HashSet::from([parent_id.to_string()]);
        let mut chain = vec![parent];
        while let Some(next) = chain.last().and_then(|c| c.spec.parent.clone()) {
            if !visited.insert(next.clone()) {
                break;
            }
            match self.client.fetch::<Comment>(&next).await? {
                Some(ancestor) => chain.push(ancestor),
                None => break,
            }
        }
        chain.reverse();

        // chain[i] 的深度为 i + 1，新回复的父评论深度不能超过 max_depth - 1
        let limit = (self.max_depth - 1).min(chain.len());
        Ok(chain[..limit]
            .iter()
            .rev()
            .find(|c| c.phase().is_live())
            .map(|c| c.id().to_string()))
    }
}

fn sort_by_creation(comments: &mut [Comment]) {
    comments.sort_by(|a, b| {
        a.created_at()
            .cmp(&b.created_at())
            .then_with(|| a.id().cmp(b.id()))
    });
}

/// 最近的已通过审核的祖先
fn approved_anchor(comment: &Comment, by_id: &HashMap<&str, &Comment>) -> Option<String> {
    let mut visited = HashSet::new();
    let mut current = comment.parent();
    while let Some(id) = current {
        if !visited.insert(id) {
            return None;
        }
        let ancestor = by_id.get(id)?;
        if ancestor.phase() == CommentPhase::Approved {
            return Some(id.to_string());
        }
        current = ancestor.parent();
    }
    None
}

fn build_nodes(anchor: Option<String>, children: &mut HashMap<Option<String>, Vec<Comment>>) -> Vec<CommentNode> {
    let Some(comments) = children.remove(&anchor) else {
        return Vec::new();
    };
    comments
        .into_iter()
        .map(|comment| {
            let replies = build_nodes(Some(comment.id().to_string()), children);
            CommentNode { comment, replies }
        })
        .collect()
}

#[async_trait]
impl<C: ExtensionClient> CommentThreadManager for DefaultCommentThreadManager<C> {
    async fn submit(&self, request: CommentRequest) -> Result<Comment, ContentError> {
        let post = self
            .client
            .fetch::<Post>(&request.post)
            .await?
            .ok_or_else(|| ContentError::not_found("Post", &request.post))?;

        let parent = match request.parent.as_deref().filter(|p| !p.is_empty()) {
            Some(parent_id) => self.effective_parent(&request.post, parent_id).await?,
            None => None,
        };
        if parent.as_deref() != request.parent.as_deref() {
            tracing::debug!(
                "Reply to {:?} on post {} re-attached to {:?}",
                request.parent,
                request.post,
                parent
            );
        }

        let comment = Comment::new(
            CommentSpec {
                post: request.post,
                parent,
                author: request.author,
                body: request.body,
            },
            &post.spec.owner,
        );
        let comment = self.client.create(comment).await?;
        tracing::info!("Comment {} submitted on post {}", comment.id(), comment.spec.post);
        Ok(comment)
    }

    async fn moderate(&self, comment_id: &str, decision: ModerationDecision) -> Result<Comment, ContentError> {
        let mut attempts = 0;
        loop {
            let mut comment = self.require(comment_id).await?;
            if comment.phase().is_terminal() {
                return Err(ContentError::AlreadyModerated {
                    id: comment_id.to_string(),
                    phase: comment.phase(),
                });
            }

            comment.status.phase = decision.into();
            comment.status.moderated_at = Some(Utc::now());
            comment.sync_labels();
            match self.client.update(comment).await {
                Ok(comment) => {
                    tracing::info!("Comment {} moderated as {}", comment_id, comment.phase().as_str());
                    return Ok(comment);
                }
                // 另一个审核者可能已经处理，重读后由终态检查给出结果
                Err(ExtensionError::VersionMismatch { .. }) if attempts < self.max_write_attempts => {
                    attempts += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn thread_of(&self, post_id: &str) -> Result<Vec<CommentNode>, ContentError> {
        if self.client.fetch::<Post>(post_id).await?.is_none() {
            return Err(ContentError::not_found("Post", post_id));
        }
        let all = self
            .comments_of(format!("{}={}", constant::COMMENT_POST_LABEL, post_id))
            .await?;
        let by_id: HashMap<&str, &Comment> = all.iter().map(|c| (c.id(), c)).collect();

        let mut children: HashMap<Option<String>, Vec<Comment>> = HashMap::new();
        for comment in all.iter().filter(|c| c.phase() == CommentPhase::Approved) {
            children
                .entry(approved_anchor(comment, &by_id))
                .or_default()
                .push(comment.clone());
        }
        for siblings in children.values_mut() {
            sort_by_creation(siblings);
        }
        Ok(build_nodes(None, &mut children))
    }

    async fn pending_queue_for(&self, author: &str) -> Result<Vec<Comment>, ContentError> {
        self.comments_of(format!(
            "{}={},{}={}",
            constant::COMMENT_POST_OWNER_LABEL,
            author,
            constant::COMMENT_PHASE_LABEL,
            CommentPhase::Pending.as_str()
        ))
        .await
    }

    async fn delete(&self, comment_id: &str) -> Result<(), ContentError> {
        let mut attempts = 0;
        loop {
            let comment = self.require(comment_id).await?;
            let replies = self
                .comments_of(format!("{}={}", constant::COMMENT_PARENT_LABEL, comment_id))
                .await?;

            let mut batch = Batch::new();
            for mut reply in replies.iter().cloned() {
                reply.spec.parent = comment.spec.parent.clone();
                reply.sync_labels();
                batch.update(&reply)?;
            }
            batch.delete(&comment);

            match self.client.apply(batch).await {
                Ok(_) => {
                    tracing::info!("Deleted comment {}, re-parented {} replies", comment_id, replies.len());
                    return Ok(());
                }
                Err(e) if e.is_retryable() && attempts < self.max_write_attempts => {
                    attempts += 1;
                    tracing::debug!("Comment {} changed concurrently, retrying delete", comment_id);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn get(&self, comment_id: &str) -> Result<Option<Comment>, ContentError> {
        Ok(self.client.fetch(comment_id).await?)
    }

    async fn approved_count(&self, post_id: &str) -> Result<u64, ContentError> {
        let selector = format!(
            "{}={},{}={}",
            constant::COMMENT_POST_LABEL,
            post_id,
            constant::COMMENT_PHASE_LABEL,
            CommentPhase::Approved.as_str()
        );
        Ok(self
            .client
            .list::<Comment>(ListOptions::with_label_selector(selector))
            .await?
            .total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::memory_client;
    use quill_domain::content::PostSpec;
    use quill_infra::ReactiveExtensionClient;

    struct Fixture {
        client: Arc<ReactiveExtensionClient>,
        manager: Arc<DefaultCommentThreadManager<ReactiveExtensionClient>>,
    }

    impl Fixture {
        fn new() -> Self {
            let client = memory_client();
            let manager = Arc::new(DefaultCommentThreadManager::new(client.clone(), &ContentSettings::default()));
            Self { client, manager }
        }

        async fn post(&self, slug: &str, owner: &str) -> String {
            let post = Post::new(PostSpec {
                title: slug.to_string(),
                slug: slug.to_string(),
                body: String::new(),
                excerpt: None,
                owner: owner.to_string(),
                category: None,
                tags: Default::default(),
                series: None,
                featured: false,
            });
            self.client.create(post).await.unwrap().id().to_string()
        }

        async fn reply(&self, post: &str, parent: Option<&str>) -> Comment {
            self.manager
                .submit(CommentRequest {
                    post: post.to_string(),
                    parent: parent.map(str::to_string),
                    author: "bob".to_string(),
                    body: "hi".to_string(),
                })
                .await
                .unwrap()
        }

        async fn depth(&self, comment: &Comment) -> usize {
            let mut depth = 1;
            let mut current = comment.spec.parent.clone();
            while let Some(id) = current {
                depth += 1;
                current = self.manager.get(&id).await.unwrap().unwrap().spec.parent;
            }
            depth
        }
    }

    /// 测试：超过深度上限的回复被挂到允许的祖先下
    #[tokio::test]
    async fn test_depth_is_capped() {
        let f = Fixture::new();
        let post = f.post("p", "alice").await;

        let mut parent: Option<String> = None;
        let mut chain = Vec::new();
        for _ in 0..8 {
            let comment = f.reply(&post, parent.as_deref()).await;
            assert!(f.depth(&comment).await <= 5);
            parent = Some(comment.id().to_string());
            chain.push(comment);
        }
        // 第5条起都挂在第4层下
        assert_eq!(chain[4].parent(), Some(chain[3].id()));
        assert_eq!(chain[7].parent(), Some(chain[3].id()));
        assert_eq!(f.depth(&chain[7]).await, 5);
    }

    #[tokio::test]
    async fn test_reply_skips_rejected_ancestors() {
        let f = Fixture::new();
        let post = f.post("p", "alice").await;
        let root = f.reply(&post, None).await;
        let child = f.reply(&post, Some(root.id())).await;
        f.manager.moderate(child.id(), ModerationDecision::Spam).await.unwrap();

        let reply = f.reply(&post, Some(child.id())).await;
        assert_eq!(reply.parent(), Some(root.id()));

        f.manager.moderate(root.id(), ModerationDecision::Reject).await.unwrap();
        let orphan = f.reply(&post, Some(child.id())).await;
        assert!(orphan.parent().is_none());
    }

    /// 测试：回复其他文章的评论被拒绝
    #[tokio::test]
    async fn test_cross_post_reply() {
        let f = Fixture::new();
        let a = f.post("a", "alice").await;
        let b = f.post("b", "alice").await;
        let comment = f.reply(&a, None).await;

        let err = f
            .manager
            .submit(CommentRequest {
                post: b.clone(),
                parent: Some(comment.id().to_string()),
                author: "bob".to_string(),
                body: "wrong thread".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::CrossPostReply { .. }));
        assert!(f.manager.pending_queue_for("alice").await.unwrap().len() == 1);

        let err = f
            .manager
            .submit(CommentRequest {
                post: b.clone(),
                parent: Some("missing".to_string()),
                author: "bob".to_string(),
                body: "?".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::NotFound { kind: "Comment", .. }));

        let err = f
            .manager
            .submit(CommentRequest {
                post: "missing".to_string(),
                parent: None,
                author: "bob".to_string(),
                body: "?".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::NotFound { kind: "Post", .. }));
    }

    /// 测试：已审核的评论不能再次审核
    #[tokio::test]
    async fn test_moderate_twice() {
        let f = Fixture::new();
        let post = f.post("p", "alice").await;
        let comment = f.reply(&post, None).await;

        let approved = f.manager.moderate(comment.id(), ModerationDecision::Approve).await.unwrap();
        assert_eq!(approved.phase(), CommentPhase::Approved);
        assert!(approved.status.moderated_at.is_some());

        let err = f.manager.moderate(comment.id(), ModerationDecision::Spam).await.unwrap_err();
        assert!(matches!(err, ContentError::AlreadyModerated { phase: CommentPhase::Approved, .. }));
        let current = f.manager.get(comment.id()).await.unwrap().unwrap();
        assert_eq!(current.phase(), CommentPhase::Approved);
    }

    /// 测试：并发审核只有一个成功
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_moderation() {
        let f = Fixture::new();
        let post = f.post("p", "alice").await;
        let comment = f.reply(&post, None).await;

        let decisions = [ModerationDecision::Approve, ModerationDecision::Reject, ModerationDecision::Spam];
        let handles: Vec<_> = decisions
            .into_iter()
            .map(|decision| {
                let manager = f.manager.clone();
                let id = comment.id().to_string();
                tokio::spawn(async move { manager.moderate(&id, decision).await })
            })
            .collect();

        let mut winners = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Ok(comment) => winners.push(comment.phase()),
                Err(ContentError::AlreadyModerated { .. }) => {}
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!(winners.len(), 1);
        let current = f.manager.get(comment.id()).await.unwrap().unwrap();
        assert_eq!(current.phase(), winners[0]);
    }

    /// 测试：未审核祖先下的已通过回复挂到最近的已通过祖先
    #[tokio::test]
    async fn test_thread_lifts_approved_replies() {
        let f = Fixture::new();
        let post = f.post("p", "alice").await;
        let root = f.reply(&post, None).await;
        let pending = f.reply(&post, Some(root.id())).await;
        let deep = f.reply(&post, Some(pending.id())).await;
        let orphan_parent = f.reply(&post, None).await;
        let orphan = f.reply(&post, Some(orphan_parent.id())).await;
        let second_root = f.reply(&post, None).await;

        for id in [root.id(), deep.id(), orphan.id(), second_root.id()] {
            f.manager.moderate(id, ModerationDecision::Approve).await.unwrap();
        }

        let thread = f.manager.thread_of(&post).await.unwrap();
        let top: Vec<_> = thread.iter().map(|n| n.comment.id()).collect();
        assert_eq!(top, vec![root.id(), orphan.id(), second_root.id()]);
        assert_eq!(thread[0].replies.len(), 1);
        assert_eq!(thread[0].replies[0].comment.id(), deep.id());
        assert_eq!(f.manager.approved_count(&post).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_pending_queue_for_author() {
        let f = Fixture::new();
        let mine = f.post("mine", "alice").await;
        let theirs = f.post("theirs", "carol").await;
        let first = f.reply(&mine, None).await;
        let second = f.reply(&mine, None).await;
        f.reply(&theirs, None).await;
        let third = f.reply(&mine, None).await;
        f.manager.moderate(second.id(), ModerationDecision::Approve).await.unwrap();

        let queue = f.manager.pending_queue_for("alice").await.unwrap();
        let ids: Vec<_> = queue.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![first.id(), third.id()]);
    }

    /// 测试：删除评论时回复改挂到上一层
    #[tokio::test]
    async fn test_delete_reparents_replies() {
        let f = Fixture::new();
        let post = f.post("p", "alice").await;
        let root = f.reply(&post, None).await;
        let middle = f.reply(&post, Some(root.id())).await;
        let leaf_a = f.reply(&post, Some(middle.id())).await;
        let leaf_b = f.reply(&post, Some(middle.id())).await;

        f.manager.delete(middle.id()).await.unwrap();
        assert!(f.manager.get(middle.id()).await.unwrap().is_none());
        for leaf in [&leaf_a, &leaf_b] {
            let current = f.manager.get(leaf.id()).await.unwrap().unwrap();
            assert_eq!(current.parent(), Some(root.id()));
        }

        f.manager.delete(root.id()).await.unwrap();
        let current = f.manager.get(leaf_a.id()).await.unwrap().unwrap();
        assert!(current.parent().is_none());

        let err = f.manager.delete(root.id()).await.unwrap_err();
        assert!(matches!(err, ContentError::NotFound { .. }));
    }
}

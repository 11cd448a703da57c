//! Turns stored posts into what the pages render.
//!
//! Home, search, filter, profile and the single-post page all go through
//! [`FeedAssembler`], so a post carries the same counts, viewer reaction and
//! donation badge wherever it appears.

use std::sync::Arc;

use crate::auth::Identity;
use crate::db::models::{
    format_timestamp, Comment, CommentId, Post, PostId, ReactionKind, Subject, UserId,
};
use crate::donations::should_show_donated_label;
use crate::reactions::ReactionEngine;
use crate::repository::{CommentRepository, StoreError};

#[derive(Debug, Clone)]
pub struct CommentCard {
    pub id: CommentId,
    pub post_id: PostId,
    pub post_title: String,
    pub username: String,
    pub profile_picture: String,
    pub content: String,
    pub formatted_created_at: String,
    pub likes: i64,
    pub dislikes: i64,
    pub liked: bool,
    pub disliked: bool,
    pub is_owner: bool,
}

#[derive(Debug, Clone)]
pub struct PostCard {
    pub id: PostId,
    pub user_id: UserId,
    pub username: String,
    pub profile_picture: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub formatted_created_at: String,
    pub is_donation: bool,
    pub donation_country: String,
    pub show_donated_label: bool,
    pub likes: i64,
    pub dislikes: i64,
    pub liked: bool,
    pub disliked: bool,
    pub is_owner: bool,
    pub comments: Vec<CommentCard>,
}

struct Tally {
    likes: i64,
    dislikes: i64,
    liked: bool,
    disliked: bool,
}

#[derive(Clone)]
pub struct FeedAssembler {
    reactions: ReactionEngine,
    comments: Arc<dyn CommentRepository>,
}

impl FeedAssembler {
    pub fn new(reactions: ReactionEngine, comments: Arc<dyn CommentRepository>) -> Self {
        Self {
            reactions,
            comments,
        }
    }

    /// Decorate `posts` for `viewer`. Comments are loaded only when asked for.
    pub async fn cards(
        &self,
        posts: Vec<Post>,
        viewer: &Identity,
        with_comments: bool,
    ) -> Result<Vec<PostCard>, StoreError> {
        let mut cards = Vec::with_capacity(posts.len());
        for post in posts {
            cards.push(self.card(post, viewer, with_comments).await?);
        }
        Ok(cards)
    }

    pub async fn card(
        &self,
        post: Post,
        viewer: &Identity,
        with_comments: bool,
    ) -> Result<PostCard, StoreError> {
        let tally = self.tally(Subject::Post(post.id), viewer).await?;
        let comments = if with_comments {
            let stored = self.comments.comments_for_post(post.id).await?;
            self.comment_cards(stored, viewer).await?
        } else {
            Vec::new()
        };

        let show_donated_label = should_show_donated_label(&post, viewer);
        let is_owner = viewer.user_id() == Some(post.user_id);

        Ok(PostCard {
            id: post.id,
            user_id: post.user_id,
            username: post.username,
            profile_picture: post.profile_picture,
            title: post.title,
            content: post.content,
            category: post.category,
            formatted_created_at: format_timestamp(&post.created_at),
            is_donation: post.is_donation,
            donation_country: post.donation_country,
            show_donated_label,
            likes: tally.likes,
            dislikes: tally.dislikes,
            liked: tally.liked,
            disliked: tally.disliked,
            is_owner,
            comments,
        })
    }

    pub async fn comment_cards(
        &self,
        comments: Vec<Comment>,
        viewer: &Identity,
    ) -> Result<Vec<CommentCard>, StoreError> {
        let mut cards = Vec::with_capacity(comments.len());
        for comment in comments {
            let tally = self.tally(Subject::Comment(comment.id), viewer).await?;
            cards.push(CommentCard {
                id: comment.id,
                post_id: comment.post_id,
                post_title: comment.post_title,
                username: comment.username,
                profile_picture: comment.profile_picture,
                formatted_created_at: format_timestamp(&comment.created_at),
                content: comment.content,
                likes: tally.likes,
                dislikes: tally.dislikes,
                liked: tally.liked,
                disliked: tally.disliked,
                is_owner: viewer.user_id() == Some(comment.user_id),
            });
        }
        Ok(cards)
    }

    async fn tally(&self, subject: Subject, viewer: &Identity) -> Result<Tally, StoreError> {
        let counts = self.reactions.count_reactions(subject).await?;
        let mine = match viewer.user_id() {
            Some(id) => self.reactions.user_reaction(id, subject).await?,
            None => None,
        };
        Ok(Tally {
            likes: counts.likes,
            dislikes: counts.dislikes,
            liked: mine == Some(ReactionKind::Like),
            disliked: mine == Some(ReactionKind::Dislike),
        })
    }
}

use std::sync::Arc;

use crate::db::models::{ReactionCounts, ReactionKind, Subject, UserId};
use crate::repository::{ReactionRepository, StoreError};

/// What a vote does to the stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionAction {
    Insert,
    Update,
    Noop,
}

/// Transition table for (existing, requested). There is no path back to "none".
pub fn plan(existing: Option<ReactionKind>, requested: ReactionKind) -> ReactionAction {
    match existing {
        None => ReactionAction::Insert,
        Some(current) if current == requested => ReactionAction::Noop,
        Some(_) => ReactionAction::Update,
    }
}

/// Likes and dislikes on posts and comments, at most one per user per subject.
#[derive(Clone)]
pub struct ReactionEngine {
    repo: Arc<dyn ReactionRepository>,
}

impl ReactionEngine {
    pub fn new(repo: Arc<dyn ReactionRepository>) -> Self {
        Self { repo }
    }

    /// Callers must have resolved `user_id` from an authenticated session.
    pub async fn set_reaction(
        &self,
        user_id: UserId,
        subject: Subject,
        kind: ReactionKind,
    ) -> Result<ReactionAction, StoreError> {
        let existing = self.repo.find_reaction(subject, user_id).await?;
        let action = plan(existing, kind);

        match action {
            ReactionAction::Insert => self.repo.insert_reaction(subject, user_id, kind).await?,
            ReactionAction::Update => self.repo.update_reaction(subject, user_id, kind).await?,
            ReactionAction::Noop => {}
        }

        tracing::debug!(
            "Reaction {:?} by user {} on {:?}: {:?}",
            kind,
            user_id,
            subject,
            action
        );
        Ok(action)
    }

    pub async fn count_reactions(&self, subject: Subject) -> Result<ReactionCounts, StoreError> {
        self.repo.count_reactions(subject).await
    }

    /// `None` means the user never reacted; lookup failures are errors.
    pub async fn user_reaction(
        &self,
        user_id: UserId,
        subject: Subject,
    ) -> Result<Option<ReactionKind>, StoreError> {
        self.repo.find_reaction(subject, user_id).await
    }
}

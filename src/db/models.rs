use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type PostId = i64;
pub type CommentId = i64;

/// Country value for users who never picked one.
pub const NO_LOCATION: &str = "no_location";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub profile_picture: String,
    pub country: String,
    pub show_donations_in_country_only: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub profile_picture: String,
}

/// A post joined with its author's display fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub user_id: UserId,
    pub username: String,
    pub profile_picture: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub created_at: String,
    pub is_donation: bool,
    pub donation_country: String,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: UserId,
    pub title: String,
    pub content: String,
    pub category: String,
    pub is_donation: bool,
    pub donation_country: String,
}

#[derive(Debug, Clone)]
pub struct PostEdit {
    pub title: String,
    pub content: String,
    pub category: String,
    pub is_donation: bool,
    pub donation_country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub user_id: UserId,
    pub username: String,
    pub profile_picture: String,
    pub content: String,
    pub created_at: String,
    pub post_title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl ReactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Dislike => "dislike",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown reaction kind: {0}")]
pub struct UnknownReactionKind(pub String);

impl FromStr for ReactionKind {
    type Err = UnknownReactionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(ReactionKind::Like),
            "dislike" => Ok(ReactionKind::Dislike),
            other => Err(UnknownReactionKind(other.to_string())),
        }
    }
}

/// The post or comment a reaction targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    Post(PostId),
    Comment(CommentId),
}

impl Subject {
    pub fn kind_str(&self) -> &'static str {
        match self {
            Subject::Post(_) => "post",
            Subject::Comment(_) => "comment",
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Subject::Post(id) | Subject::Comment(id) => *id,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReactionCounts {
    pub likes: i64,
    pub dislikes: i64,
}

/// Render a stored timestamp as "02 Jan 2006, 15:04"; unparseable input passes through.
pub fn format_timestamp(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%d %b %Y, %H:%M").to_string();
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        Ok(dt) => dt.format("%d %b %Y, %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaction_kind_parses_form_values() {
        assert_eq!("like".parse::<ReactionKind>(), Ok(ReactionKind::Like));
        assert_eq!("dislike".parse::<ReactionKind>(), Ok(ReactionKind::Dislike));
        assert!("love".parse::<ReactionKind>().is_err());
        assert!("".parse::<ReactionKind>().is_err());
    }

    #[test]
    fn subject_exposes_type_and_id() {
        assert_eq!(Subject::Post(7).kind_str(), "post");
        assert_eq!(Subject::Comment(3).kind_str(), "comment");
        assert_eq!(Subject::Comment(3).id(), 3);
    }

    #[test]
    fn format_timestamp_handles_rfc3339_and_sqlite_formats() {
        assert_eq!(format_timestamp("2024-03-05T09:07:00Z"), "05 Mar 2024, 09:07");
        assert_eq!(format_timestamp("2024-03-05 09:07:00"), "05 Mar 2024, 09:07");
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }
}

use async_trait::async_trait;
use rusqlite::types::ToSql;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

use super::{
    CommentRepository, PostFilter, PostRepository, ReactionRepository, SessionRepository,
    StoreError, UserRepository,
};
use crate::db::models::*;
use crate::state::DbPool;

const USER_COLUMNS: &str = "id, username, email, password_hash, profile_picture, country, \
     show_donations_in_country_only, created_at";

const POST_COLUMNS: &str = "p.id, p.user_id, u.username, u.profile_picture, p.title, p.content, \
     p.category, p.created_at, p.is_donation, p.donation_country";

const COMMENT_COLUMNS: &str = "c.id, c.post_id, c.user_id, u.username, u.profile_picture, \
     c.content, c.created_at, p.title";

fn rewrite_donation_country(
    conn: &rusqlite::Connection,
    user_id: UserId,
    country: &str,
) -> rusqlite::Result<u64> {
    let rows = conn.execute(
        "UPDATE posts SET donation_country = ?1 WHERE user_id = ?2",
        params![country, user_id],
    )?;
    Ok(rows as u64)
}

/// SQLite implementation of every repository trait.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        profile_picture: row.get(4)?,
        country: row.get(5)?,
        show_donations_in_country_only: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        user_id: row.get(1)?,
        username: row.get(2)?,
        profile_picture: row.get(3)?,
        title: row.get(4)?,
        content: row.get(5)?,
        category: row.get(6)?,
        created_at: row.get(7)?,
        is_donation: row.get(8)?,
        donation_country: row.get(9)?,
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        user_id: row.get(2)?,
        username: row.get(3)?,
        profile_picture: row.get(4)?,
        content: row.get(5)?,
        created_at: row.get(6)?,
        post_title: row.get(7)?,
    })
}

fn conflict_or_sql(e: rusqlite::Error, what: &str) -> StoreError {
    match e {
        rusqlite::Error::SqliteFailure(ref err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::Conflict(what.to_string())
        }
        other => StoreError::Sql(other),
    }
}

/// Escape LIKE wildcards so user input only matches literally.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl UserRepository for SqliteStore {
    async fn create_user(&self, user: &NewUser) -> Result<UserId, StoreError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO users (username, email, password_hash, profile_picture)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                user.username,
                user.email,
                user.password_hash,
                user.profile_picture
            ],
        )
        .map_err(|e| conflict_or_sql(e, "username or email already registered"))?;
        Ok(conn.last_insert_rowid())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    async fn save_country_preferences(
        &self,
        id: UserId,
        country: &str,
        show_donations_in_country_only: bool,
        rewrite_posts: bool,
    ) -> Result<u64, StoreError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        let touched = if rewrite_posts {
            rewrite_donation_country(&tx, id, country)?
        } else {
            0
        };
        tx.execute(
            "UPDATE users SET country = ?1, show_donations_in_country_only = ?2 WHERE id = ?3",
            params![country, show_donations_in_country_only, id],
        )?;
        tx.commit()?;
        Ok(touched)
    }

    async fn has_cookie_consent(&self, id: UserId) -> Result<bool, StoreError> {
        let conn = self.pool.get()?;
        let given: Option<bool> = conn
            .query_row(
                "SELECT consent_given FROM cookie_consent WHERE user_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(given.unwrap_or(false))
    }

    async fn save_cookie_consent(&self, id: UserId, given: bool) -> Result<(), StoreError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO cookie_consent (user_id, consent_given) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET consent_given = excluded.consent_given",
            params![id, given],
        )?;
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for SqliteStore {
    async fn find_session_user(&self, token: &str) -> Result<Option<UserId>, StoreError> {
        let conn = self.pool.get()?;
        let user_id = conn
            .query_row(
                "SELECT user_id FROM sessions WHERE token = ?1",
                params![token],
                |row| row.get(0),
            )
            .optional()?;
        Ok(user_id)
    }

    async fn upsert_session(&self, user_id: UserId, token: &str) -> Result<(), StoreError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO sessions (user_id, token) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET
               token = excluded.token,
               created_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')",
            params![user_id, token],
        )?;
        Ok(())
    }

    async fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        let conn = self.pool.get()?;
        conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(())
    }
}

#[async_trait]
impl ReactionRepository for SqliteStore {
    async fn find_reaction(
        &self,
        subject: Subject,
        user_id: UserId,
    ) -> Result<Option<ReactionKind>, StoreError> {
        let conn = self.pool.get()?;
        let kind: Option<String> = conn
            .query_row(
                "SELECT kind FROM reactions
                 WHERE subject_type = ?1 AND subject_id = ?2 AND user_id = ?3",
                params![subject.kind_str(), subject.id(), user_id],
                |row| row.get(0),
            )
            .optional()?;

        // The CHECK constraint keeps anything else out of the column
        Ok(kind.and_then(|k| k.parse().ok()))
    }

    async fn insert_reaction(
        &self,
        subject: Subject,
        user_id: UserId,
        kind: ReactionKind,
    ) -> Result<(), StoreError> {
        let conn = self.pool.get()?;
        // Upsert: a concurrent first vote from the same user lands on the unique index
        conn.execute(
            "INSERT INTO reactions (subject_type, subject_id, user_id, kind)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(subject_type, subject_id, user_id) DO UPDATE SET kind = excluded.kind",
            params![subject.kind_str(), subject.id(), user_id, kind.as_str()],
        )?;
        Ok(())
    }

    async fn update_reaction(
        &self,
        subject: Subject,
        user_id: UserId,
        kind: ReactionKind,
    ) -> Result<(), StoreError> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE reactions SET kind = ?1
             WHERE subject_type = ?2 AND subject_id = ?3 AND user_id = ?4",
            params![kind.as_str(), subject.kind_str(), subject.id(), user_id],
        )?;
        Ok(())
    }

    async fn count_reactions(&self, subject: Subject) -> Result<ReactionCounts, StoreError> {
        let conn = self.pool.get()?;
        let counts = conn.query_row(
            "SELECT
                COALESCE(SUM(CASE WHEN kind = 'like' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN kind = 'dislike' THEN 1 ELSE 0 END), 0)
             FROM reactions WHERE subject_type = ?1 AND subject_id = ?2",
            params![subject.kind_str(), subject.id()],
            |row| {
                Ok(ReactionCounts {
                    likes: row.get(0)?,
                    dislikes: row.get(1)?,
                })
            },
        )?;
        Ok(counts)
    }
}

#[async_trait]
impl PostRepository for SqliteStore {
    async fn create_post(&self, post: &NewPost) -> Result<PostId, StoreError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO posts (user_id, title, content, category, is_donation, donation_country)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                post.user_id,
                post.title,
                post.content,
                post.category,
                post.is_donation,
                post.donation_country
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    async fn find_post(&self, id: PostId) -> Result<Option<Post>, StoreError> {
        let conn = self.pool.get()?;
        let post = conn
            .query_row(
                &format!(
                    "SELECT {POST_COLUMNS} FROM posts p JOIN users u ON u.id = p.user_id
                     WHERE p.id = ?1"
                ),
                params![id],
                post_from_row,
            )
            .optional()?;
        Ok(post)
    }

    async fn update_post(&self, id: PostId, edit: &PostEdit) -> Result<(), StoreError> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE posts
             SET title = ?1, content = ?2, category = ?3, is_donation = ?4, donation_country = ?5
             WHERE id = ?6",
            params![
                edit.title,
                edit.content,
                edit.category,
                edit.is_donation,
                edit.donation_country,
                id
            ],
        )?;
        Ok(())
    }

    async fn delete_post(&self, id: PostId) -> Result<(), StoreError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM reactions WHERE subject_type = 'comment'
             AND subject_id IN (SELECT id FROM comments WHERE post_id = ?1)",
            params![id],
        )?;
        tx.execute(
            "DELETE FROM reactions WHERE subject_type = 'post' AND subject_id = ?1",
            params![id],
        )?;
        // Comments go with the post via ON DELETE CASCADE
        tx.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(())
    }

    async fn filter_posts(&self, filter: &PostFilter) -> Result<Vec<Post>, StoreError> {
        let mut sql = format!(
            "SELECT {POST_COLUMNS} FROM posts p JOIN users u ON u.id = p.user_id WHERE 1=1"
        );
        let mut args: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(ref category) = filter.category {
            sql.push_str(" AND p.category = ?");
            args.push(Box::new(category.clone()));
        }
        if let Some(start) = filter.start_date {
            sql.push_str(" AND date(p.created_at) >= date(?)");
            args.push(Box::new(start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = filter.end_date {
            sql.push_str(" AND date(p.created_at) <= date(?)");
            args.push(Box::new(end.format("%Y-%m-%d").to_string()));
        }
        if let Some(author) = filter.created_by {
            sql.push_str(" AND p.user_id = ?");
            args.push(Box::new(author));
        }
        if let Some(liker) = filter.liked_by {
            sql.push_str(
                " AND p.id IN (SELECT subject_id FROM reactions
                   WHERE subject_type = 'post' AND user_id = ? AND kind = 'like')",
            );
            args.push(Box::new(liker));
        }
        sql.push_str(" ORDER BY p.created_at DESC, p.id DESC");

        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&sql)?;
        let posts = stmt
            .query_map(params_from_iter(args.iter()), post_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    async fn top_liked_posts(&self, limit: u32) -> Result<Vec<Post>, StoreError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {POST_COLUMNS}, COUNT(r.id) AS like_count
             FROM posts p
             JOIN users u ON u.id = p.user_id
             LEFT JOIN reactions r
               ON r.subject_type = 'post' AND r.subject_id = p.id AND r.kind = 'like'
             GROUP BY p.id
             ORDER BY like_count DESC, p.created_at DESC, p.id DESC
             LIMIT ?1"
        ))?;
        let posts = stmt
            .query_map(params![limit], post_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    async fn search_posts(&self, query: &str) -> Result<Vec<Post>, StoreError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts p JOIN users u ON u.id = p.user_id
             WHERE p.title LIKE ?1 ESCAPE '\\'
                OR p.content LIKE ?1 ESCAPE '\\'
                OR p.category LIKE ?1 ESCAPE '\\'
                OR u.username LIKE ?1 ESCAPE '\\'
             ORDER BY p.created_at DESC, p.id DESC"
        ))?;
        let posts = stmt
            .query_map(params![like_pattern(query)], post_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    async fn posts_reacted_by(
        &self,
        user_id: UserId,
        kind: ReactionKind,
    ) -> Result<Vec<Post>, StoreError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {POST_COLUMNS}
             FROM posts p
             JOIN users u ON u.id = p.user_id
             JOIN reactions r ON r.subject_type = 'post' AND r.subject_id = p.id
             WHERE r.user_id = ?1 AND r.kind = ?2
             ORDER BY p.created_at DESC, p.id DESC"
        ))?;
        let posts = stmt
            .query_map(params![user_id, kind.as_str()], post_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    async fn categories(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.pool.get()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT category FROM posts WHERE category <> '' ORDER BY category")?;
        let categories = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(categories)
    }

    async fn update_donation_country_for_author(
        &self,
        user_id: UserId,
        country: &str,
    ) -> Result<u64, StoreError> {
        let conn = self.pool.get()?;
        Ok(rewrite_donation_country(&conn, user_id, country)?)
    }
}

#[async_trait]
impl CommentRepository for SqliteStore {
    async fn create_comment(
        &self,
        post_id: PostId,
        user_id: UserId,
        content: &str,
    ) -> Result<CommentId, StoreError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO comments (post_id, user_id, content) VALUES (?1, ?2, ?3)",
            params![post_id, user_id, content],
        )?;
        Ok(conn.last_insert_rowid())
    }

    async fn find_comment(&self, id: CommentId) -> Result<Option<Comment>, StoreError> {
        let conn = self.pool.get()?;
        let comment = conn
            .query_row(
                &format!(
                    "SELECT {COMMENT_COLUMNS}
                     FROM comments c
                     JOIN users u ON u.id = c.user_id
                     JOIN posts p ON p.id = c.post_id
                     WHERE c.id = ?1"
                ),
                params![id],
                comment_from_row,
            )
            .optional()?;
        Ok(comment)
    }

    async fn comments_for_post(&self, post_id: PostId) -> Result<Vec<Comment>, StoreError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {COMMENT_COLUMNS}
             FROM comments c
             JOIN users u ON u.id = c.user_id
             JOIN posts p ON p.id = c.post_id
             WHERE c.post_id = ?1
             ORDER BY c.created_at ASC, c.id ASC"
        ))?;
        let comments = stmt
            .query_map(params![post_id], comment_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }

    async fn comments_by_user(&self, user_id: UserId) -> Result<Vec<Comment>, StoreError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {COMMENT_COLUMNS}
             FROM comments c
             JOIN users u ON u.id = c.user_id
             JOIN posts p ON p.id = c.post_id
             WHERE c.user_id = ?1
             ORDER BY c.created_at DESC, c.id DESC"
        ))?;
        let comments = stmt
            .query_map(params![user_id], comment_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }

    async fn delete_comment(&self, id: CommentId) -> Result<(), StoreError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM reactions WHERE subject_type = 'comment' AND subject_id = ?1",
            params![id],
        )?;
        tx.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(())
    }
}

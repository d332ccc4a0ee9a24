//! Comment model for Dreamboard.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::db::{Timestamps, User};

/// A comment attached to a board.
///
/// Board and author ids are fixed at creation; only the content changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    id: i64,
    content: String,
    board_id: i64,
    author_id: i64,
    #[serde(flatten)]
    timestamps: Timestamps,
}

impl Comment {
    /// Unique comment ID.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Comment text (at most 500 characters).
    pub fn content(&self) -> &str {
        &self.content
    }

    /// ID of the board the comment belongs to.
    pub fn board_id(&self) -> i64 {
        self.board_id
    }

    /// ID of the user who wrote the comment.
    pub fn author_id(&self) -> i64 {
        self.author_id
    }

    /// Audit timestamps.
    pub fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    /// Replace the content. Persist with `CommentRepository::save_changes`.
    pub fn update_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub(crate) fn touch(&mut self, at: DateTime<Utc>) {
        self.timestamps.touch(at);
    }
}

/// Data for creating a new comment.
#[derive(Debug, Clone)]
pub struct NewComment {
    /// Comment text.
    pub content: String,
    /// Board the comment is attached to.
    pub board_id: i64,
    /// Author user ID.
    pub author_id: i64,
}

impl NewComment {
    /// Create a new comment with the required fields.
    pub fn new(content: impl Into<String>, board_id: i64, author_id: i64) -> Self {
        Self {
            content: content.into(),
            board_id,
            author_id,
        }
    }
}

/// A comment together with its author.
#[derive(Debug, Clone, Serialize)]
pub struct CommentWithAuthor {
    /// The comment.
    pub comment: Comment,
    /// The comment's author.
    pub author: User,
}

pub(crate) fn comment_columns(alias: &str, prefix: &str) -> String {
    ["id", "content", "board_id", "user_id", "created_at", "updated_at"]
        .iter()
        .map(|col| format!("{alias}.{col} AS {prefix}{col}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Database row type for Comment.
#[derive(sqlx::FromRow)]
pub(crate) struct CommentRow {
    id: i64,
    content: String,
    board_id: i64,
    user_id: i64,
    created_at: String,
    updated_at: String,
}

impl CommentRow {
    pub(crate) fn from_prefixed(row: &SqliteRow, prefix: &str) -> Result<Self, sqlx::Error> {
        let col = |name: &str| format!("{prefix}{name}");
        Ok(Self {
            id: row.try_get(col("id").as_str())?,
            content: row.try_get(col("content").as_str())?,
            board_id: row.try_get(col("board_id").as_str())?,
            user_id: row.try_get(col("user_id").as_str())?,
            created_at: row.try_get(col("created_at").as_str())?,
            updated_at: row.try_get(col("updated_at").as_str())?,
        })
    }

    pub(crate) fn from_prefixed_optional(
        row: &SqliteRow,
        prefix: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let id: Option<i64> = row.try_get(format!("{prefix}id").as_str())?;
        match id {
            Some(_) => Self::from_prefixed(row, prefix).map(Some),
            None => Ok(None),
        }
    }
}

impl TryFrom<CommentRow> for Comment {
    type Error = sqlx::Error;

    fn try_from(row: CommentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            timestamps: Timestamps::from_stored(&row.created_at, &row.updated_at)?,
            id: row.id,
            content: row.content,
            board_id: row.board_id,
            author_id: row.user_id,
        })
    }
}

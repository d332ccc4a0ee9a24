//! Board model for Dreamboard.
//!
//! This module defines the Board entity (a post on the bulletin board) and
//! the joined shapes the repository returns with it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::comment::CommentWithAuthor;
use crate::db::{Timestamps, User};

/// A board (post) written by a user.
///
/// The author id is fixed at creation. Title and content change through
/// [`Board::update_title_content`]; the view counter is normally bumped
/// with `BoardRepository::increment_view_count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Board {
    id: i64,
    title: String,
    content: String,
    view_count: i64,
    author_id: i64,
    #[serde(flatten)]
    timestamps: Timestamps,
}

impl Board {
    /// Unique board ID.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Title (at most 200 characters).
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Body text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Number of times the board was viewed.
    pub fn view_count(&self) -> i64 {
        self.view_count
    }

    /// ID of the user who wrote the board.
    pub fn author_id(&self) -> i64 {
        self.author_id
    }

    /// Audit timestamps.
    pub fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    /// Replace title and content. Persist with `BoardRepository::save_changes`.
    pub fn update_title_content(&mut self, title: impl Into<String>, content: impl Into<String>) {
        self.title = title.into();
        self.content = content.into();
    }

    /// Add one view to the in-memory copy.
    ///
    /// Not safe under concurrent viewers; the repository's
    /// `increment_view_count` is the atomic path.
    pub fn increase_view_count(&mut self) {
        self.view_count += 1;
    }

    pub(crate) fn touch(&mut self, at: DateTime<Utc>) {
        self.timestamps.touch(at);
    }
}

/// Data for creating a new board.
#[derive(Debug, Clone)]
pub struct NewBoard {
    /// Title.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Author user ID.
    pub author_id: i64,
}

impl NewBoard {
    /// Create a new board with the required fields.
    pub fn new(title: impl Into<String>, content: impl Into<String>, author_id: i64) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            author_id,
        }
    }
}

/// A board together with its author, loaded by one join.
#[derive(Debug, Clone, Serialize)]
pub struct BoardWithAuthor {
    /// The board.
    pub board: Board,
    /// The board's author.
    pub author: User,
}

/// A board with its author and every comment (each with its author),
/// comments oldest first.
#[derive(Debug, Clone, Serialize)]
pub struct BoardDetail {
    /// The board.
    pub board: Board,
    /// The board's author.
    pub author: User,
    /// Comments on the board.
    pub comments: Vec<CommentWithAuthor>,
}

/// List entry: a board, its author and how many comments it has.
#[derive(Debug, Clone, Serialize)]
pub struct BoardSummary {
    /// The board.
    pub board: Board,
    /// The board's author.
    pub author: User,
    /// Number of comments on the board.
    pub comment_count: i64,
}

/// Column list for selecting a board under `alias`, each column renamed
/// with `prefix`.
pub(crate) fn board_columns(alias: &str, prefix: &str) -> String {
    [
        "id",
        "title",
        "content",
        "view_count",
        "user_id",
        "created_at",
        "updated_at",
    ]
    .iter()
    .map(|col| format!("{alias}.{col} AS {prefix}{col}"))
    .collect::<Vec<_>>()
    .join(", ")
}

/// Database row type for Board.
#[derive(sqlx::FromRow)]
pub(crate) struct BoardRow {
    id: i64,
    title: String,
    content: String,
    view_count: i64,
    user_id: i64,
    created_at: String,
    updated_at: String,
}

impl BoardRow {
    /// Decode a board selected with [`board_columns`] and `prefix`.
    pub(crate) fn from_prefixed(row: &SqliteRow, prefix: &str) -> Result<Self, sqlx::Error> {
        let col = |name: &str| format!("{prefix}{name}");
        Ok(Self {
            id: row.try_get(col("id").as_str())?,
            title: row.try_get(col("title").as_str())?,
            content: row.try_get(col("content").as_str())?,
            view_count: row.try_get(col("view_count").as_str())?,
            user_id: row.try_get(col("user_id").as_str())?,
            created_at: row.try_get(col("created_at").as_str())?,
            updated_at: row.try_get(col("updated_at").as_str())?,
        })
    }

    /// Like [`BoardRow::from_prefixed`], for the nullable side of a LEFT JOIN.
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

impl TryFrom<BoardRow> for Board {
    type Error = sqlx::Error;

    fn try_from(row: BoardRow) -> Result<Self, Self::Error> {
        Ok(Self {
            timestamps: Timestamps::from_stored(&row.created_at, &row.updated_at)?,
            id: row.id,
            title: row.title,
            content: row.content,
            view_count: row.view_count,
            author_id: row.user_id,
        })
    }
}

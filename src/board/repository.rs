//! Board repository for Dreamboard.
//!
//! This module provides CRUD operations and listings for boards.

use sqlx::sqlite::SqliteRow;
use tracing::{debug, info};

use super::comment::{comment_columns, CommentRow, CommentWithAuthor};
use super::paging::{Page, PageRequest};
use super::types::{board_columns, Board, BoardDetail, BoardRow, BoardWithAuthor, NewBoard};
use crate::db::{
    contains_pattern, format_timestamp, search_key, user_columns, CascadeReport, Database, User,
    UserRow,
};
use crate::{DreamboardError, Result};

/// `SELECT` head for a board joined with its author.
fn with_author_select() -> String {
    format!(
        "SELECT {}, {} FROM boards b JOIN users u ON u.id = b.user_id",
        board_columns("b", "b_"),
        user_columns("u", "a_")
    )
}

fn decode_with_author(row: &SqliteRow) -> std::result::Result<BoardWithAuthor, sqlx::Error> {
    Ok(BoardWithAuthor {
        board: BoardRow::from_prefixed(row, "b_")?.try_into()?,
        author: UserRow::from_prefixed(row, "a_")?.try_into()?,
    })
}

fn decode_all(rows: &[SqliteRow]) -> Result<Vec<BoardWithAuthor>> {
    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push(decode_with_author(row)?);
    }
    Ok(items)
}

/// Repository for board CRUD operations.
pub struct BoardRepository<'a> {
    db: &'a Database,
}

impl<'a> BoardRepository<'a> {
    /// Create a new BoardRepository with the given database reference.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a new board.
    ///
    /// Fails with a constraint violation if the author does not exist.
    pub async fn create(&self, new_board: &NewBoard) -> Result<Board> {
        let now = format_timestamp(&self.db.clock().now());

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO boards
                 (title, title_key, content, view_count, user_id, created_at, updated_at)
             VALUES (?, ?, ?, 0, ?, ?, ?)
             RETURNING id",
        )
        .bind(&new_board.title)
        .bind(search_key(&new_board.title))
        .bind(&new_board.content)
        .bind(new_board.author_id)
        .bind(&now)
        .bind(&now)
        .fetch_one(self.db.pool())
        .await?;

        info!(board_id = id, author_id = new_board.author_id, "Board created");

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DreamboardError::NotFound("board".to_string()))
    }

    /// Get a board by ID.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Board>> {
        let sql = format!("SELECT {} FROM boards b WHERE b.id = ?", board_columns("b", ""));
        let row = sqlx::query_as::<_, BoardRow>(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.map(Board::try_from).transpose()?)
    }

    /// Get a board and its author in one query.
    pub async fn find_by_id_with_author(&self, id: i64) -> Result<Option<BoardWithAuthor>> {
        let sql = format!("{} WHERE b.id = ?", with_author_select());
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.as_ref().map(decode_with_author).transpose()?)
    }

    /// Get a board, its author, and every comment with its author, in one
    /// query. Comments are ordered oldest first.
    pub async fn find_by_id_with_author_and_comments(&self, id: i64) -> Result<Option<BoardDetail>> {
        let sql = format!(
            "SELECT {}, {}, {}, {} FROM boards b
             JOIN users u ON u.id = b.user_id
             LEFT JOIN comments c ON c.board_id = b.id
             LEFT JOIN users cu ON cu.id = c.user_id
             WHERE b.id = ?
             ORDER BY c.created_at ASC, c.id ASC",
            board_columns("b", "b_"),
            user_columns("u", "a_"),
            comment_columns("c", "c_"),
            user_columns("cu", "ca_")
        );
        let rows = sqlx::query(&sql)
            .bind(id)
            .fetch_all(self.db.pool())
            .await?;

        let Some(first) = rows.first() else {
            return Ok(None);
        };
        let BoardWithAuthor { board, author } = decode_with_author(first)?;

        let mut comments = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(comment) = CommentRow::from_prefixed_optional(row, "c_")? {
                comments.push(CommentWithAuthor {
                    comment: comment.try_into()?,
                    author: User::try_from(UserRow::from_prefixed(row, "ca_")?)?,
                });
            }
        }

        Ok(Some(BoardDetail {
            board,
            author,
            comments,
        }))
    }

    /// List all boards, newest first.
    pub async fn find_all_paged(&self, request: PageRequest) -> Result<Page<BoardWithAuthor>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM boards")
            .fetch_one(self.db.pool())
            .await?;

        let sql = format!(
            "{} ORDER BY b.created_at DESC, b.id ASC LIMIT ? OFFSET ?",
            with_author_select()
        );
        let rows = sqlx::query(&sql)
            .bind(request.size())
            .bind(request.offset())
            .fetch_all(self.db.pool())
            .await?;

        Ok(Page::new(decode_all(&rows)?, total, request))
    }

    /// List one author's boards, newest first.
    pub async fn find_by_author_id(
        &self,
        author_id: i64,
        request: PageRequest,
    ) -> Result<Page<BoardWithAuthor>> {
        let total = self.count_by_author_id(author_id).await?;

        let sql = format!(
            "{} WHERE b.user_id = ? ORDER BY b.created_at DESC, b.id ASC LIMIT ? OFFSET ?",
            with_author_select()
        );
        let rows = sqlx::query(&sql)
            .bind(author_id)
            .bind(request.size())
            .bind(request.offset())
            .fetch_all(self.db.pool())
            .await?;

        Ok(Page::new(decode_all(&rows)?, total, request))
    }

    /// Find boards whose title contains `text`, ignoring case, newest first.
    pub async fn search_by_title(
        &self,
        text: &str,
        request: PageRequest,
    ) -> Result<Page<BoardWithAuthor>> {
        let pattern = contains_pattern(text);

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM boards WHERE title_key LIKE ? ESCAPE '\\'")
                .bind(&pattern)
                .fetch_one(self.db.pool())
                .await?;

        let sql = format!(
            "{} WHERE b.title_key LIKE ? ESCAPE '\\'
             ORDER BY b.created_at DESC, b.id ASC LIMIT ? OFFSET ?",
            with_author_select()
        );
        let rows = sqlx::query(&sql)
            .bind(&pattern)
            .bind(request.size())
            .bind(request.offset())
            .fetch_all(self.db.pool())
            .await?;

        Ok(Page::new(decode_all(&rows)?, total, request))
    }

    /// The `limit` most viewed boards.
    pub async fn find_top_by_view_count(&self, limit: i64) -> Result<Vec<BoardWithAuthor>> {
        let sql = format!(
            "{} ORDER BY b.view_count DESC, b.id ASC LIMIT ?",
            with_author_select()
        );
        let rows = sqlx::query(&sql)
            .bind(limit.max(0))
            .fetch_all(self.db.pool())
            .await?;

        decode_all(&rows)
    }

    /// Count boards written by `author_id`.
    pub async fn count_by_author_id(&self, author_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM boards WHERE user_id = ?")
            .bind(author_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    /// Count all boards.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM boards")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    /// Add one view in a single statement.
    ///
    /// Returns the number of rows changed: 1, or 0 if the board does not
    /// exist. `updated_at` is left alone.
    pub async fn increment_view_count(&self, id: i64) -> Result<u64> {
        let result = sqlx::query("UPDATE boards SET view_count = view_count + 1 WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected())
    }

    /// Persist title and content of `board`.
    ///
    /// The view count is not written; it only changes through
    /// [`BoardRepository::increment_view_count`].
    pub async fn save_changes(&self, board: &mut Board) -> Result<()> {
        let now = self.db.clock().now();

        let result = sqlx::query(
            "UPDATE boards SET title = ?, title_key = ?, content = ?, updated_at = ? WHERE id = ?",
        )
        .bind(board.title())
        .bind(search_key(board.title()))
        .bind(board.content())
        .bind(format_timestamp(&now))
        .bind(board.id())
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DreamboardError::NotFound("board".to_string()));
        }

        board.touch(now);
        debug!(board_id = board.id(), "Board saved");
        Ok(())
    }

    /// Delete a board and its comments in one transaction.
    pub async fn delete(&self, id: i64) -> Result<CascadeReport> {
        let mut tx = self.db.begin().await?;

        let comments = sqlx::query("DELETE FROM comments WHERE board_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let boards = sqlx::query("DELETE FROM boards WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        if boards > 0 {
            info!(board_id = id, comments, "Board deleted");
        }
        Ok(CascadeReport {
            users: 0,
            boards,
            comments,
        })
    }
}

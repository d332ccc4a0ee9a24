//! Comment repository for Dreamboard.

use std::collections::HashMap;

use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Sqlite};
use tracing::{debug, info};

use super::comment::{comment_columns, Comment, CommentRow, CommentWithAuthor, NewComment};
use super::paging::{Page, PageRequest};
use crate::db::{format_timestamp, user_columns, Database, UserRow};
use crate::{DreamboardError, Result};

fn with_author_select() -> String {
    format!(
        "SELECT {}, {} FROM comments c JOIN users u ON u.id = c.user_id",
        comment_columns("c", "c_"),
        user_columns("u", "a_")
    )
}

fn decode_with_author(row: &SqliteRow) -> std::result::Result<CommentWithAuthor, sqlx::Error> {
    Ok(CommentWithAuthor {
        comment: CommentRow::from_prefixed(row, "c_")?.try_into()?,
        author: UserRow::from_prefixed(row, "a_")?.try_into()?,
    })
}

/// Most ids bound into one `IN (...)` list. Older SQLite builds cap a
/// statement at 999 variables.
pub const IN_LIST_CHUNK: usize = 900;

fn sorted_unique(ids: &[i64]) -> Vec<i64> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn decode_all(rows: &[SqliteRow]) -> Result<Vec<CommentWithAuthor>> {
    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push(decode_with_author(row)?);
    }
    Ok(items)
}

/// Repository for comment CRUD operations.
pub struct CommentRepository<'a> {
    db: &'a Database,
}

impl<'a> CommentRepository<'a> {
    /// Create a new CommentRepository with the given database reference.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a new comment.
    ///
    /// Fails with a constraint violation if the board or the author does
    /// not exist.
    pub async fn create(&self, new_comment: &NewComment) -> Result<Comment> {
        let now = format_timestamp(&self.db.clock().now());

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO comments (content, board_id, user_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(&new_comment.content)
        .bind(new_comment.board_id)
        .bind(new_comment.author_id)
        .bind(&now)
        .bind(&now)
        .fetch_one(self.db.pool())
        .await?;

        info!(
            comment_id = id,
            board_id = new_comment.board_id,
            author_id = new_comment.author_id,
            "Comment created"
        );

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DreamboardError::NotFound("comment".to_string()))
    }

    /// Get a comment by ID.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Comment>> {
        let sql = format!(
            "SELECT {} FROM comments c WHERE c.id = ?",
            comment_columns("c", "")
        );
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.map(Comment::try_from).transpose()?)
    }

    /// Get a comment and its author.
    pub async fn find_by_id_with_author(&self, id: i64) -> Result<Option<CommentWithAuthor>> {
        let sql = format!("{} WHERE c.id = ?", with_author_select());
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.as_ref().map(decode_with_author).transpose()?)
    }

    /// All comments on a board with their authors, oldest first.
    pub async fn find_by_board_id_with_author(
        &self,
        board_id: i64,
    ) -> Result<Vec<CommentWithAuthor>> {
        let sql = format!(
            "{} WHERE c.board_id = ? ORDER BY c.created_at ASC, c.id ASC",
            with_author_select()
        );
        let rows = sqlx::query(&sql)
            .bind(board_id)
            .fetch_all(self.db.pool())
            .await?;

        decode_all(&rows)
    }

    /// One page of a board's comments, oldest first.
    pub async fn find_by_board_id_paged(
        &self,
        board_id: i64,
        request: PageRequest,
    ) -> Result<Page<CommentWithAuthor>> {
        let total = self.count_by_board_id(board_id).await?;

        let sql = format!(
            "{} WHERE c.board_id = ? ORDER BY c.created_at ASC, c.id ASC LIMIT ? OFFSET ?",
            with_author_select()
        );
        let rows = sqlx::query(&sql)
            .bind(board_id)
            .bind(request.size())
            .bind(request.offset())
            .fetch_all(self.db.pool())
            .await?;

        Ok(Page::new(decode_all(&rows)?, total, request))
    }

    /// One page of a user's comments, newest first.
    pub async fn find_by_author_id(
        &self,
        author_id: i64,
        request: PageRequest,
    ) -> Result<Page<Comment>> {
        let total = self.count_by_author_id(author_id).await?;

        let sql = format!(
            "SELECT {} FROM comments c WHERE c.user_id = ?
             ORDER BY c.created_at DESC, c.id ASC LIMIT ? OFFSET ?",
            comment_columns("c", "")
        );
        let rows = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(author_id)
            .bind(request.size())
            .bind(request.offset())
            .fetch_all(self.db.pool())
            .await?;

        let items = rows
            .into_iter()
            .map(Comment::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total, request))
    }

    /// Comments with authors for several boards.
    ///
    /// One query per [`IN_LIST_CHUNK`] distinct ids. Ordered by board, then
    /// oldest first. No query is issued for an empty slice.
    pub async fn find_by_board_ids(&self, board_ids: &[i64]) -> Result<Vec<CommentWithAuthor>> {
        let mut items = Vec::new();
        for chunk in sorted_unique(board_ids).chunks(IN_LIST_CHUNK) {
            let mut query: QueryBuilder<Sqlite> =
                QueryBuilder::new(format!("{} WHERE c.board_id IN (", with_author_select()));
            let mut separated = query.separated(", ");
            for id in chunk {
                separated.push_bind(*id);
            }
            separated.push_unseparated(") ORDER BY c.board_id ASC, c.created_at ASC, c.id ASC");

            let rows = query.build().fetch_all(self.db.pool()).await?;
            items.extend(decode_all(&rows)?);
        }
        Ok(items)
    }

    /// Count comments on a board.
    pub async fn count_by_board_id(&self, board_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE board_id = ?")
            .bind(board_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    /// Count comments written by a user.
    pub async fn count_by_author_id(&self, author_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE user_id = ?")
            .bind(author_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    /// Count all comments.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    /// Comment counts for several boards, one grouped query per
    /// [`IN_LIST_CHUNK`] distinct ids.
    ///
    /// Every requested id is present in the result; boards without
    /// comments map to 0.
    pub async fn count_by_board_ids(&self, board_ids: &[i64]) -> Result<HashMap<i64, i64>> {
        let mut counts: HashMap<i64, i64> = board_ids.iter().map(|id| (*id, 0)).collect();
        for chunk in sorted_unique(board_ids).chunks(IN_LIST_CHUNK) {
            let mut query: QueryBuilder<Sqlite> =
                QueryBuilder::new("SELECT board_id, COUNT(*) FROM comments WHERE board_id IN (");
            let mut separated = query.separated(", ");
            for id in chunk {
                separated.push_bind(*id);
            }
            separated.push_unseparated(") GROUP BY board_id");

            let rows: Vec<(i64, i64)> = query
                .build_query_as()
                .fetch_all(self.db.pool())
                .await?;
            counts.extend(rows);
        }
        Ok(counts)
    }

    /// Check whether `author_id` has commented on `board_id`.
    pub async fn exists_by_board_id_and_author_id(
        &self,
        board_id: i64,
        author_id: i64,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM comments WHERE board_id = ? AND user_id = ?)",
        )
        .bind(board_id)
        .bind(author_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(exists)
    }

    /// Persist the content of `comment`.
    pub async fn save_changes(&self, comment: &mut Comment) -> Result<()> {
        let now = self.db.clock().now();

        let result = sqlx::query("UPDATE comments SET content = ?, updated_at = ? WHERE id = ?")
            .bind(comment.content())
            .bind(format_timestamp(&now))
            .bind(comment.id())
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DreamboardError::NotFound("comment".to_string()));
        }

        comment.touch(now);
        debug!(comment_id = comment.id(), "Comment saved");
        Ok(())
    }

    /// Delete a comment. Returns true if a row was removed.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(comment_id = id, "Comment deleted");
        }
        Ok(deleted)
    }
}

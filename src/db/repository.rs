//! User repository for Dreamboard.
//!
//! This module provides CRUD operations for users in the database.

use tracing::{debug, info};

use super::timestamps::format_timestamp;
use super::user::{user_columns, NewUser, User, UserRow};
use super::{contains_pattern, search_key, CascadeReport, Database};
use crate::board::{board_columns, comment_columns, Board, BoardRow, Comment, CommentRow};
use crate::{DreamboardError, Result};

/// Repository for user CRUD operations.
pub struct UserRepository<'a> {
    db: &'a Database,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database reference.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a new user in the database.
    ///
    /// Returns the created user with the assigned ID. A duplicate email
    /// (compared case-insensitively) fails with a constraint violation.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let now = format_timestamp(&self.db.clock().now());

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users
                 (email, password, nickname, nickname_key, role, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(&new_user.email)
        .bind(&new_user.password)
        .bind(&new_user.nickname)
        .bind(search_key(&new_user.nickname))
        .bind(new_user.role.as_str())
        .bind(&now)
        .bind(&now)
        .fetch_one(self.db.pool())
        .await?;

        info!(user_id = id, role = %new_user.role, "User created");

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DreamboardError::NotFound("user".to_string()))
    }

    /// Get a user by ID.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users u WHERE u.id = ?", user_columns("u", ""));
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.map(User::try_from).transpose()?)
    }

    /// Get a user by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users u WHERE u.email = ?",
            user_columns("u", "")
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.map(User::try_from).transpose()?)
    }

    /// Check if an email is already registered.
    pub async fn exists_by_email(&self, email: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
            .bind(email)
            .fetch_one(self.db.pool())
            .await?;
        Ok(exists)
    }

    /// Find users whose nickname contains `text`, ignoring case.
    ///
    /// Results are ordered by ID. `%` and `_` in `text` match literally.
    pub async fn search_by_nickname(&self, text: &str) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users u
             WHERE u.nickname_key LIKE ? ESCAPE '\\'
             ORDER BY u.id",
            user_columns("u", "")
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(contains_pattern(text))
            .fetch_all(self.db.pool())
            .await?;

        let users = rows
            .into_iter()
            .map(User::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Get a user and all of their boards (newest first) in one query.
    pub async fn find_by_email_with_boards(
        &self,
        email: &str,
    ) -> Result<Option<(User, Vec<Board>)>> {
        let sql = format!(
            "SELECT {}, {} FROM users u
             LEFT JOIN boards b ON b.user_id = u.id
             WHERE u.email = ?
             ORDER BY b.created_at DESC, b.id ASC",
            user_columns("u", "u_"),
            board_columns("b", "b_")
        );
        let rows = sqlx::query(&sql)
            .bind(email)
            .fetch_all(self.db.pool())
            .await?;

        let Some(first) = rows.first() else {
            return Ok(None);
        };
        let user = User::try_from(UserRow::from_prefixed(first, "u_")?)?;

        let mut boards = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(board) = BoardRow::from_prefixed_optional(row, "b_")? {
                boards.push(Board::try_from(board)?);
            }
        }

        Ok(Some((user, boards)))
    }

    /// Get a user and all of their comments (newest first) in one query.
    pub async fn find_by_email_with_comments(
        &self,
        email: &str,
    ) -> Result<Option<(User, Vec<Comment>)>> {
        let sql = format!(
            "SELECT {}, {} FROM users u
             LEFT JOIN comments c ON c.user_id = u.id
             WHERE u.email = ?
             ORDER BY c.created_at DESC, c.id ASC",
            user_columns("u", "u_"),
            comment_columns("c", "c_")
        );
        let rows = sqlx::query(&sql)
            .bind(email)
            .fetch_all(self.db.pool())
            .await?;

        let Some(first) = rows.first() else {
            return Ok(None);
        };
        let user = User::try_from(UserRow::from_prefixed(first, "u_")?)?;

        let mut comments = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(comment) = CommentRow::from_prefixed_optional(row, "c_")? {
                comments.push(Comment::try_from(comment)?);
            }
        }

        Ok(Some((user, comments)))
    }

    /// Persist the mutable columns of `user` (nickname, password).
    ///
    /// Stamps a new `updated_at` on both the row and `user`. Fails with
    /// `NotFound` if the user no longer exists.
    pub async fn save_changes(&self, user: &mut User) -> Result<()> {
        let now = self.db.clock().now();

        let result = sqlx::query(
            "UPDATE users SET nickname = ?, nickname_key = ?, password = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(user.nickname())
        .bind(search_key(user.nickname()))
        .bind(user.password())
        .bind(format_timestamp(&now))
        .bind(user.id())
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DreamboardError::NotFound("user".to_string()));
        }

        user.touch(now);
        debug!(user_id = user.id(), "User saved");
        Ok(())
    }

    /// Delete a user together with everything they own.
    ///
    /// In one transaction, removes comments on the user's boards, comments
    /// the user wrote elsewhere, the user's boards and finally the user. Any
    /// failure rolls back the whole delete. Deleting a missing user removes
    /// nothing and returns an empty report.
    pub async fn delete(&self, id: i64) -> Result<CascadeReport> {
        let mut tx = self.db.begin().await?;

        let on_boards = sqlx::query(
            "DELETE FROM comments WHERE board_id IN (SELECT id FROM boards WHERE user_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let written = sqlx::query("DELETE FROM comments WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let boards = sqlx::query("DELETE FROM boards WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let users = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        let report = CascadeReport {
            users,
            boards,
            comments: on_boards + written,
        };
        if report.deleted() {
            info!(
                user_id = id,
                boards = report.boards,
                comments = report.comments,
                "User deleted"
            );
        }
        Ok(report)
    }

    /// Count all users.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BoardRepository, CommentRepository, NewBoard, NewComment};
    use crate::db::Role;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn new_user(n: u32) -> NewUser {
        NewUser::new(format!("user{n}@example.com"), "encoded", format!("user{n}"))
    }

    #[tokio::test]
    async fn test_create_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(&db);

        let user = repo.create(&new_user(1)).await.unwrap();

        assert_eq!(user.id(), 1);
        assert_eq!(user.email(), "user1@example.com");
        assert_eq!(user.nickname(), "user1");
        assert_eq!(user.role(), Role::User);
        assert_eq!(
            user.timestamps().created_at(),
            user.timestamps().updated_at()
        );
    }

    #[tokio::test]
    async fn test_create_admin() {
        let db = setup_db().await;
        let repo = UserRepository::new(&db);

        let user = repo
            .create(&new_user(1).with_role(Role::Admin))
            .await
            .unwrap();
        assert!(user.is_admin());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_constraint_violation() {
        let db = setup_db().await;
        let repo = UserRepository::new(&db);

        repo.create(&new_user(1)).await.unwrap();
        let dup = NewUser::new("USER1@example.com", "encoded", "other");
        let err = repo.create(&dup).await.unwrap_err();

        assert!(err.is_constraint_violation());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_by_id_and_email() {
        let db = setup_db().await;
        let repo = UserRepository::new(&db);
        let created = repo.create(&new_user(1)).await.unwrap();

        let by_id = repo.find_by_id(created.id()).await.unwrap().unwrap();
        assert_eq!(by_id, created);

        let by_email = repo
            .find_by_email("User1@Example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id(), created.id());

        assert!(repo.find_by_id(999).await.unwrap().is_none());
        assert!(repo
            .find_by_email("nobody@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_exists_by_email() {
        let db = setup_db().await;
        let repo = UserRepository::new(&db);

        assert!(!repo.exists_by_email("user1@example.com").await.unwrap());
        repo.create(&new_user(1)).await.unwrap();
        assert!(repo.exists_by_email("user1@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_search_by_nickname() {
        let db = setup_db().await;
        let repo = UserRepository::new(&db);

        repo.create(&NewUser::new("a@example.com", "x", "RustFan"))
            .await
            .unwrap();
        repo.create(&NewUser::new("b@example.com", "x", "rustacean"))
            .await
            .unwrap();
        repo.create(&NewUser::new("c@example.com", "x", "gopher"))
            .await
            .unwrap();

        let found = repo.search_by_nickname("RUST").await.unwrap();
        let names: Vec<&str> = found.iter().map(|u| u.nickname()).collect();
        assert_eq!(names, vec!["RustFan", "rustacean"]);

        assert!(repo.search_by_nickname("%").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_by_nickname_follows_renames() {
        let db = setup_db().await;
        let repo = UserRepository::new(&db);
        let mut user = repo
            .create(&NewUser::new("a@example.com", "x", "Ölfan"))
            .await
            .unwrap();

        assert_eq!(repo.search_by_nickname("ölf").await.unwrap().len(), 1);

        user.update_nickname("Даша");
        repo.save_changes(&mut user).await.unwrap();

        assert!(repo.search_by_nickname("ölf").await.unwrap().is_empty());
        let found = repo.search_by_nickname("даша").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].nickname(), "Даша");
    }

    #[tokio::test]
    async fn test_save_changes_stamps_updated_at() {
        let db = setup_db().await;
        let repo = UserRepository::new(&db);
        let mut user = repo.create(&new_user(1)).await.unwrap();
        let created_at = user.timestamps().created_at();
        let before = user.timestamps().updated_at();

        user.update_nickname("renamed");
        repo.save_changes(&mut user).await.unwrap();

        let stored = repo.find_by_id(user.id()).await.unwrap().unwrap();
        assert_eq!(stored.nickname(), "renamed");
        assert_eq!(stored.timestamps().created_at(), created_at);
        assert!(stored.timestamps().updated_at() > before);
        assert_eq!(stored, user);
    }

    #[tokio::test]
    async fn test_save_changes_missing_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(&db);
        let mut user = repo.create(&new_user(1)).await.unwrap();
        repo.delete(user.id()).await.unwrap();

        let err = repo.save_changes(&mut user).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_find_by_email_with_boards_and_comments() {
        let db = setup_db().await;
        let users = UserRepository::new(&db);
        let boards = BoardRepository::new(&db);
        let comments = CommentRepository::new(&db);

        let user = users.create(&new_user(1)).await.unwrap();
        let lonely = users.create(&new_user(2)).await.unwrap();
        let b1 = boards
            .create(&NewBoard::new("first", "body", user.id()))
            .await
            .unwrap();
        let b2 = boards
            .create(&NewBoard::new("second", "body", user.id()))
            .await
            .unwrap();
        comments
            .create(&NewComment::new("hi", b1.id(), user.id()))
            .await
            .unwrap();

        let (found, found_boards) = users
            .find_by_email_with_boards(user.email())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id(), user.id());
        let ids: Vec<i64> = found_boards.iter().map(|b| b.id()).collect();
        assert_eq!(ids, vec![b2.id(), b1.id()]);

        let (_, found_comments) = users
            .find_by_email_with_comments(user.email())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found_comments.len(), 1);
        assert_eq!(found_comments[0].content(), "hi");

        let (_, none) = users
            .find_by_email_with_boards(lonely.email())
            .await
            .unwrap()
            .unwrap();
        assert!(none.is_empty());

        assert!(users
            .find_by_email_with_boards("ghost@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let db = setup_db().await;
        let users = UserRepository::new(&db);
        let boards = BoardRepository::new(&db);
        let comments = CommentRepository::new(&db);

        let author = users.create(&new_user(1)).await.unwrap();
        let other = users.create(&new_user(2)).await.unwrap();

        let own = boards
            .create(&NewBoard::new("own", "body", author.id()))
            .await
            .unwrap();
        let foreign = boards
            .create(&NewBoard::new("foreign", "body", other.id()))
            .await
            .unwrap();

        // other user's comment on the author's board
        comments
            .create(&NewComment::new("a", own.id(), other.id()))
            .await
            .unwrap();
        // author's comment on another board
        comments
            .create(&NewComment::new("b", foreign.id(), author.id()))
            .await
            .unwrap();
        let kept = comments
            .create(&NewComment::new("c", foreign.id(), other.id()))
            .await
            .unwrap();

        let report = users.delete(author.id()).await.unwrap();
        assert_eq!(
            report,
            CascadeReport {
                users: 1,
                boards: 1,
                comments: 2
            }
        );

        assert!(users.find_by_id(author.id()).await.unwrap().is_none());
        assert!(boards.find_by_id(own.id()).await.unwrap().is_none());
        assert!(boards.find_by_id(foreign.id()).await.unwrap().is_some());
        assert_eq!(comments.count_by_board_id(foreign.id()).await.unwrap(), 1);
        assert!(comments.find_by_id(kept.id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_missing_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(&db);

        let report = repo.delete(42).await.unwrap();
        assert_eq!(report, CascadeReport::default());
        assert!(!report.deleted());
    }
}

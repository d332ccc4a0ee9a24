//! Board service for Dreamboard.
//!
//! This module wires write requests, author checks and the repositories
//! together.

use tracing::{info, warn};

use super::comment::Comment;
use super::comment_repository::CommentRepository;
use super::dto::{BoardWriteRequest, CommentWriteRequest};
use super::paging::{Page, PageRequest};
use super::repository::BoardRepository;
use super::types::{Board, BoardDetail, BoardSummary};
use crate::db::{CascadeReport, Database, User};
use crate::{DreamboardError, Result};

/// Service for board and comment operations with author checks.
pub struct BoardService<'a> {
    db: &'a Database,
}

impl<'a> BoardService<'a> {
    /// Create a new BoardService.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn boards(&self) -> BoardRepository<'a> {
        BoardRepository::new(self.db)
    }

    fn comments(&self) -> CommentRepository<'a> {
        CommentRepository::new(self.db)
    }

    async fn get_board(&self, board_id: i64) -> Result<Board> {
        self.boards()
            .find_by_id(board_id)
            .await?
            .ok_or_else(|| DreamboardError::NotFound("board".to_string()))
    }

    async fn get_comment(&self, comment_id: i64) -> Result<Comment> {
        self.comments()
            .find_by_id(comment_id)
            .await?
            .ok_or_else(|| DreamboardError::NotFound("comment".to_string()))
    }

    /// Write a new board.
    pub async fn write(&self, author_id: i64, request: BoardWriteRequest) -> Result<Board> {
        request.validate()?;
        self.boards().create(&request.into_new_board(author_id)).await
    }

    /// Edit a board's title and content. Only its author may edit it.
    pub async fn edit(
        &self,
        board_id: i64,
        editor_id: i64,
        request: BoardWriteRequest,
    ) -> Result<Board> {
        request.validate()?;

        let mut board = self.get_board(board_id).await?;
        if board.author_id() != editor_id {
            warn!(board_id, editor_id, "Board edit refused: not the author");
            return Err(DreamboardError::Permission(
                "only the author can edit this board".to_string(),
            ));
        }

        request.apply_to(&mut board);
        self.boards().save_changes(&mut board).await?;
        Ok(board)
    }

    /// Count a view and return the board with its author and comments.
    pub async fn view(&self, board_id: i64) -> Result<BoardDetail> {
        let repo = self.boards();
        if repo.increment_view_count(board_id).await? == 0 {
            return Err(DreamboardError::NotFound("board".to_string()));
        }

        repo.find_by_id_with_author_and_comments(board_id)
            .await?
            .ok_or_else(|| DreamboardError::NotFound("board".to_string()))
    }

    /// Delete a board and its comments. Allowed for the author and admins.
    pub async fn remove(&self, board_id: i64, requester: &User) -> Result<CascadeReport> {
        let board = self.get_board(board_id).await?;
        if board.author_id() != requester.id() && !requester.is_admin() {
            warn!(
                board_id,
                requester_id = requester.id(),
                "Board delete refused"
            );
            return Err(DreamboardError::Permission(
                "only the author or an admin can delete this board".to_string(),
            ));
        }

        let report = self.boards().delete(board_id).await?;
        info!(
            board_id,
            requester_id = requester.id(),
            comments = report.comments,
            "Board removed"
        );
        Ok(report)
    }

    /// Comment on a board.
    pub async fn comment(
        &self,
        board_id: i64,
        author_id: i64,
        request: CommentWriteRequest,
    ) -> Result<Comment> {
        request.validate()?;
        self.get_board(board_id).await?;
        self.comments()
            .create(&request.into_new_comment(board_id, author_id))
            .await
    }

    /// Edit a comment. Only its author may edit it.
    pub async fn edit_comment(
        &self,
        comment_id: i64,
        editor_id: i64,
        request: CommentWriteRequest,
    ) -> Result<Comment> {
        request.validate()?;

        let mut comment = self.get_comment(comment_id).await?;
        if comment.author_id() != editor_id {
            return Err(DreamboardError::Permission(
                "only the author can edit this comment".to_string(),
            ));
        }

        request.apply_to(&mut comment);
        self.comments().save_changes(&mut comment).await?;
        Ok(comment)
    }

    /// Delete a comment. Allowed for the author and admins.
    pub async fn remove_comment(&self, comment_id: i64, requester: &User) -> Result<()> {
        let comment = self.get_comment(comment_id).await?;
        if comment.author_id() != requester.id() && !requester.is_admin() {
            return Err(DreamboardError::Permission(
                "only the author or an admin can delete this comment".to_string(),
            ));
        }

        self.comments().delete(comment_id).await?;
        Ok(())
    }

    /// List boards newest first, each with its comment count.
    ///
    /// Counts come from one grouped query for the whole page.
    pub async fn list(&self, request: PageRequest) -> Result<Page<BoardSummary>> {
        let page = self.boards().find_all_paged(request).await?;

        let ids: Vec<i64> = page.items.iter().map(|b| b.board.id()).collect();
        let counts = self.comments().count_by_board_ids(&ids).await?;

        Ok(page.map(|item| {
            let comment_count = counts.get(&item.board.id()).copied().unwrap_or(0);
            BoardSummary {
                board: item.board,
                author: item.author,
                comment_count,
            }
        }))
    }
}

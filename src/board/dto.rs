//! Write requests for boards and comments.

use serde::Deserialize;

use super::comment::{Comment, NewComment};
use super::types::{Board, NewBoard};
use crate::auth::validation::{validate_comment, validate_content, validate_title, Violations};

/// Request to write or edit a board.
#[derive(Debug, Clone, Deserialize)]
pub struct BoardWriteRequest {
    /// Title (not blank, at most 200 characters).
    pub title: String,
    /// Body (not blank).
    pub content: String,
}

impl BoardWriteRequest {
    /// Create a new request.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Validate every field, collecting all violations.
    pub fn validate(&self) -> Result<(), Violations> {
        let mut violations = Violations::new();
        violations.check("title", validate_title(&self.title));
        violations.check("content", validate_content(&self.content));
        violations.into_result()
    }

    /// Turn the request into a `NewBoard` written by `author_id`.
    pub fn into_new_board(self, author_id: i64) -> NewBoard {
        NewBoard::new(self.title, self.content, author_id)
    }

    /// Copy title and content onto an existing board.
    pub fn apply_to(&self, board: &mut Board) {
        board.update_title_content(self.title.as_str(), self.content.as_str());
    }
}

/// Request to write or edit a comment.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentWriteRequest {
    /// Comment text (not blank, at most 500 characters).
    pub content: String,
}

impl CommentWriteRequest {
    /// Create a new request.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Validate the content.
    pub fn validate(&self) -> Result<(), Violations> {
        let mut violations = Violations::new();
        violations.check("content", validate_comment(&self.content));
        violations.into_result()
    }

    /// Turn the request into a `NewComment` on `board_id` by `author_id`.
    pub fn into_new_comment(self, board_id: i64, author_id: i64) -> NewComment {
        NewComment::new(self.content, board_id, author_id)
    }

    /// Copy the content onto an existing comment.
    pub fn apply_to(&self, comment: &mut Comment) {
        comment.update_content(self.content.as_str());
    }
}

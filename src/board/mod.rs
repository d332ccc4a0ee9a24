//! Board module for Dreamboard.
//!
//! This module provides bulletin board functionality including:
//! - Boards (posts) and their comments
//! - Repositories with author joins, batch fetches and paged listings
//! - Write requests with validation
//! - A service enforcing author/admin rules

mod comment;
mod comment_repository;
mod dto;
mod paging;
mod repository;
mod service;
mod types;

pub use comment::{Comment, CommentWithAuthor, NewComment};
pub use comment_repository::{CommentRepository, IN_LIST_CHUNK};
pub use dto::{BoardWriteRequest, CommentWriteRequest};
pub use paging::{Page, PageRequest, MAX_PAGE_SIZE};
pub use repository::BoardRepository;
pub use service::BoardService;
pub use types::{Board, BoardDetail, BoardSummary, BoardWithAuthor, NewBoard};

pub(crate) use comment::{comment_columns, CommentRow};
pub(crate) use types::{board_columns, BoardRow};

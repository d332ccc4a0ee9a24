//! Dreamboard - bulletin board persistence core
//!
//! Users register and log in, write boards and comment on them. The crate
//! covers the entity model, SQLite repositories, validated write requests
//! and the services tying them together.

pub mod auth;
pub mod board;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;

pub use auth::{
    authenticate, register, update_user, Argon2PasswordEncoder, FieldViolation, LoginRequest,
    PasswordEncoder, PasswordError, SignupRequest, UserUpdateRequest, ValidationError, Violations,
};
pub use board::{
    Board, BoardDetail, BoardRepository, BoardService, BoardSummary, BoardWithAuthor,
    BoardWriteRequest, Comment, CommentRepository, CommentWithAuthor, CommentWriteRequest,
    NewBoard, NewComment, Page, PageRequest,
};
pub use config::Config;
pub use db::{CascadeReport, Database, NewUser, Role, Timestamps, User, UserRepository};
pub use error::{DreamboardError, Result};

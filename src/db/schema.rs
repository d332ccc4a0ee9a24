//! Database schema and migrations for Dreamboard.
//!
//! Migrations are applied in order when the database is opened; the
//! `schema_version` table records which ones have run.
//!
//! SQLite's `LOWER()` and `LIKE` only fold ASCII, so searchable text is
//! stored a second time in a `*_key` column, case-folded by the repository.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    email       TEXT NOT NULL COLLATE NOCASE CHECK (length(email) <= 100),
    password    TEXT NOT NULL,           -- encoded, never plaintext
    nickname    TEXT NOT NULL CHECK (length(nickname) <= 50),
    nickname_key TEXT NOT NULL,          -- case-folded nickname for search
    role        TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin')),
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE UNIQUE INDEX idx_users_email ON users(email);
CREATE INDEX idx_users_created_at ON users(created_at);
"#,
    // v2: boards
    r#"
CREATE TABLE boards (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT NOT NULL CHECK (length(title) <= 200),
    title_key   TEXT NOT NULL,           -- case-folded title for search
    content     TEXT NOT NULL,
    view_count  INTEGER NOT NULL DEFAULT 0 CHECK (view_count >= 0),
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX idx_boards_user_id ON boards(user_id);
CREATE INDEX idx_boards_created_at ON boards(created_at);
CREATE INDEX idx_boards_title ON boards(title);
"#,
    // v3: comments
    r#"
CREATE TABLE comments (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    content     TEXT NOT NULL CHECK (length(content) <= 500),
    board_id    INTEGER NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX idx_comments_board_id ON comments(board_id);
CREATE INDEX idx_comments_user_id ON comments(user_id);
CREATE INDEX idx_comments_created_at ON comments(created_at);
"#,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_not_empty() {
        assert!(!MIGRATIONS.is_empty());
    }

    #[test]
    fn test_migrations_create_tables_in_dependency_order() {
        assert!(MIGRATIONS[0].contains("CREATE TABLE users"));
        assert!(MIGRATIONS[1].contains("CREATE TABLE boards"));
        assert!(MIGRATIONS[2].contains("CREATE TABLE comments"));
    }

    #[test]
    fn test_foreign_keys_cascade() {
        assert!(MIGRATIONS[1].contains("REFERENCES users(id) ON DELETE CASCADE"));
        assert!(MIGRATIONS[2].contains("REFERENCES boards(id) ON DELETE CASCADE"));
        assert!(MIGRATIONS[2].contains("REFERENCES users(id) ON DELETE CASCADE"));
    }
}

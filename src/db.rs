//! Database connection and schema.
//!
//! Supports multiple backends:
//! - Local SQLite file: `path/to/db.sqlite` or `file:path` or `sqlite://path`
//! - In-memory: `:memory:`
//! - Remote Turso: `libsql://...` or `https://...` (requires TURSO_AUTH_TOKEN env var)

use std::sync::Arc;

use libsql::{Builder, Connection, Database};

/// Shared database handle.
pub type Handle = Arc<Database>;

/// Schema for the grant store. Every statement is idempotent.
///
/// Rights are stored as 1 (read), 2 (write) or 3 (admin). A team or user holds
/// at most one right per entity, enforced by the composite primary keys.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS namespaces (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT    NOT NULL,
    owner_id    INTEGER NOT NULL,
    is_archived INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS lists (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    title        TEXT    NOT NULL,
    namespace_id INTEGER NOT NULL REFERENCES namespaces(id),
    owner_id     INTEGER NOT NULL,
    is_archived  INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_lists_namespace ON lists(namespace_id);
CREATE INDEX IF NOT EXISTS idx_lists_owner ON lists(owner_id);

CREATE TABLE IF NOT EXISTS teams (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS team_members (
    team_id INTEGER NOT NULL REFERENCES teams(id),
    user_id INTEGER NOT NULL,
    PRIMARY KEY (team_id, user_id)
);
CREATE INDEX IF NOT EXISTS idx_team_members_user ON team_members(user_id);

CREATE TABLE IF NOT EXISTS team_namespaces (
    team_id      INTEGER NOT NULL REFERENCES teams(id),
    namespace_id INTEGER NOT NULL REFERENCES namespaces(id),
    level        INTEGER NOT NULL CHECK (level BETWEEN 1 AND 3),
    PRIMARY KEY (team_id, namespace_id)
);

CREATE TABLE IF NOT EXISTS team_lists (
    team_id INTEGER NOT NULL REFERENCES teams(id),
    list_id INTEGER NOT NULL REFERENCES lists(id),
    level   INTEGER NOT NULL CHECK (level BETWEEN 1 AND 3),
    PRIMARY KEY (team_id, list_id)
);

CREATE TABLE IF NOT EXISTS users_lists (
    user_id INTEGER NOT NULL,
    list_id INTEGER NOT NULL REFERENCES lists(id),
    level   INTEGER NOT NULL CHECK (level BETWEEN 1 AND 3),
    PRIMARY KEY (user_id, list_id)
);

CREATE TABLE IF NOT EXISTS link_shares (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    token     TEXT    NOT NULL UNIQUE,
    list_id   INTEGER NOT NULL REFERENCES lists(id),
    level     INTEGER NOT NULL CHECK (level BETWEEN 1 AND 3),
    shared_by INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    list_id     INTEGER NOT NULL REFERENCES lists(id),
    title       TEXT    NOT NULL,
    description TEXT,
    done        INTEGER NOT NULL DEFAULT 0,
    priority    INTEGER NOT NULL DEFAULT 0,
    due_date    INTEGER,
    created_by  INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_tasks_list ON tasks(list_id);

CREATE TABLE IF NOT EXISTS favorites (
    user_id INTEGER NOT NULL,
    task_id INTEGER NOT NULL REFERENCES tasks(id),
    PRIMARY KEY (user_id, task_id)
);
"#;

/// Connect to the database.
///
/// # URL formats
/// - Local file: `mydata.db`, `file:path/to/db.sqlite`, `sqlite://path`
/// - In-memory: `:memory:`
/// - Remote Turso: `libsql://your-db.turso.io` (requires `TURSO_AUTH_TOKEN` env var)
pub async fn connect(url: &str) -> crate::Result<Database> {
    let db = if url.starts_with("libsql://") || url.starts_with("https://") {
        let token = std::env::var("TURSO_AUTH_TOKEN").map_err(|_| {
            crate::Error::Config("TURSO_AUTH_TOKEN not set for remote database".into())
        })?;
        Builder::new_remote(url.to_string(), token).build().await?
    } else if url == ":memory:" {
        Builder::new_local(":memory:").build().await?
    } else {
        // Local file - strip sqlite:// or file: prefix if present
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("file:"))
            .unwrap_or(url);
        Builder::new_local(path).build().await?
    };

    Ok(db)
}

/// Get a connection from the database.
pub fn connection(db: &Database) -> crate::Result<Connection> {
    Ok(db.connect()?)
}

/// Create the grant store schema if it does not exist yet.
pub async fn migrate(conn: &Connection) -> crate::Result<()> {
    conn.execute_batch(SCHEMA).await?;
    tracing::debug!("grant store schema ready");
    Ok(())
}

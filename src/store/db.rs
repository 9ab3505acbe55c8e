use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use super::models::*;
use crate::types::UuidArray;

/// Async-safe handle to the board database.
///
/// Wraps `BoardDb` behind `Arc<Mutex>` and runs all access on tokio's
/// blocking thread pool via `spawn_blocking`, so synchronous SQLite I/O never
/// ties up async worker threads.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<std::sync::Mutex<BoardDb>>,
}

impl DbHandle {
    pub fn new(db: BoardDb) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&BoardDb) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db.lock().map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
            f(&guard)
        })
        .await
        .context("DB task panicked")?
    }

    /// Acquire the database mutex synchronously. Only for startup and tests.
    pub fn lock_sync(&self) -> Result<std::sync::MutexGuard<'_, BoardDb>> {
        self.inner
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))
    }
}

pub struct BoardDb {
    conn: Connection,
}

const USER_COLUMNS: &str =
    "internal_id, public_id, name, email, password, role, created_at, updated_at";

fn user_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        internal_id: row.get(0)?,
        public_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        password: row.get(4)?,
        role: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn board_row(row: &Row<'_>) -> rusqlite::Result<Board> {
    Ok(Board {
        internal_id: row.get(0)?,
        public_id: row.get(1)?,
        owner_internal_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn list_row(row: &Row<'_>) -> rusqlite::Result<BoardList> {
    Ok(BoardList {
        internal_id: row.get(0)?,
        public_id: row.get(1)?,
        board_internal_id: row.get(2)?,
        title: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl BoardDb {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    fn init(&self) -> Result<()> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;
        self.run_migrations().context("Failed to run migrations")?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(&format!(
                "
                CREATE TABLE IF NOT EXISTS users (
                    internal_id INTEGER PRIMARY KEY AUTOINCREMENT,
                    public_id BLOB NOT NULL UNIQUE,
                    name TEXT NOT NULL,
                    email TEXT NOT NULL,
                    password TEXT NOT NULL,
                    role TEXT NOT NULL DEFAULT 'user',
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                    deleted_at TEXT
                );

                CREATE TABLE IF NOT EXISTS boards (
                    internal_id INTEGER PRIMARY KEY AUTOINCREMENT,
                    public_id BLOB NOT NULL UNIQUE,
                    owner_internal_id INTEGER NOT NULL REFERENCES users(internal_id),
                    title TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE TABLE IF NOT EXISTS board_members (
                    board_internal_id INTEGER NOT NULL REFERENCES boards(internal_id) ON DELETE CASCADE,
                    user_internal_id INTEGER NOT NULL REFERENCES users(internal_id) ON DELETE CASCADE,
                    joined_at TEXT NOT NULL DEFAULT (datetime('now')),
                    PRIMARY KEY (board_internal_id, user_internal_id)
                );

                CREATE TABLE IF NOT EXISTS lists (
                    internal_id INTEGER PRIMARY KEY AUTOINCREMENT,
                    public_id BLOB NOT NULL UNIQUE,
                    board_internal_id INTEGER NOT NULL REFERENCES boards(internal_id) ON DELETE CASCADE,
                    title TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE TABLE IF NOT EXISTS list_positions (
                    internal_id INTEGER PRIMARY KEY AUTOINCREMENT,
                    public_id BLOB NOT NULL UNIQUE,
                    board_internal_id INTEGER NOT NULL UNIQUE REFERENCES boards(internal_id) ON DELETE CASCADE,
                    list_order {list_order_type} NOT NULL DEFAULT '{{}}'
                );

                CREATE UNIQUE INDEX IF NOT EXISTS idx_users_live_email ON users(email) WHERE deleted_at IS NULL;
                CREATE INDEX IF NOT EXISTS idx_board_members_user ON board_members(user_internal_id);
                CREATE INDEX IF NOT EXISTS idx_lists_board ON lists(board_internal_id);
                ",
                list_order_type = UuidArray::SQL_TYPE,
            ))
            .context("Failed to create tables")?;
        Ok(())
    }

    // ── Users ─────────────────────────────────────────────────────────

    pub fn create_user(
        &self,
        public_id: Uuid,
        name: &str,
        email: &str,
        password_hash: &str,
        role: &Role,
    ) -> Result<User> {
        self.conn
            .execute(
                "INSERT INTO users (public_id, name, email, password, role) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![public_id, name, email, password_hash, role.as_str()],
            )
            .context("Failed to insert user")?;
        self.get_user(public_id)?
            .context("User not found after insert")
    }

    /// Look up a live (not soft-deleted) user by email.
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {USER_COLUMNS} FROM users WHERE email = ?1 AND deleted_at IS NULL"
                ),
                params![email],
                user_row,
            )
            .optional()
            .context("Failed to query user by email")?;
        row.map(UserRow::into_user).transpose()
    }

    pub fn get_user(&self, public_id: Uuid) -> Result<Option<User>> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {USER_COLUMNS} FROM users WHERE public_id = ?1 AND deleted_at IS NULL"
                ),
                params![public_id],
                user_row,
            )
            .optional()
            .context("Failed to query user")?;
        row.map(UserRow::into_user).transpose()
    }

    /// Mark a user deleted. Returns false if no live user had that id.
    pub fn soft_delete_user(&self, public_id: Uuid) -> Result<bool> {
        let count = self
            .conn
            .execute(
                "UPDATE users SET deleted_at = datetime('now'), updated_at = datetime('now')
                 WHERE public_id = ?1 AND deleted_at IS NULL",
                params![public_id],
            )
            .context("Failed to soft-delete user")?;
        Ok(count > 0)
    }

    // ── Boards ────────────────────────────────────────────────────────

    /// Create a board owned by `owner_internal_id`. The owner joins as the
    /// first member and the board starts with an empty list order.
    pub fn create_board(
        &self,
        owner_internal_id: i64,
        title: &str,
        description: &str,
    ) -> Result<Board> {
        let public_id = Uuid::new_v4();
        // Safety: DbHandle's Mutex already guarantees single-threaded access.
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;

        tx.execute(
            "INSERT INTO boards (public_id, owner_internal_id, title, description) VALUES (?1, ?2, ?3, ?4)",
            params![public_id, owner_internal_id, title, description],
        )
        .context("Failed to insert board")?;
        let board_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO board_members (board_internal_id, user_internal_id) VALUES (?1, ?2)",
            params![board_id, owner_internal_id],
        )
        .context("Failed to add board owner as member")?;

        tx.execute(
            "INSERT INTO list_positions (public_id, board_internal_id, list_order) VALUES (?1, ?2, ?3)",
            params![Uuid::new_v4(), board_id, UuidArray::new()],
        )
        .context("Failed to insert list position")?;

        tx.commit().context("Failed to commit board creation")?;
        self.get_board(public_id)?
            .context("Board not found after insert")
    }

    pub fn get_board(&self, public_id: Uuid) -> Result<Option<Board>> {
        self.conn
            .query_row(
                "SELECT internal_id, public_id, owner_internal_id, title, description, created_at, updated_at
                 FROM boards WHERE public_id = ?1",
                params![public_id],
                board_row,
            )
            .optional()
            .context("Failed to query board")
    }

    pub fn is_board_member(&self, board_internal_id: i64, user_internal_id: i64) -> Result<bool> {
        let exists: bool = self
            .conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM board_members WHERE board_internal_id = ?1 AND user_internal_id = ?2",
                params![board_internal_id, user_internal_id],
                |row| row.get(0),
            )
            .context("Failed to check board membership")?;
        Ok(exists)
    }

    pub fn add_board_member(
        &self,
        board_internal_id: i64,
        user_internal_id: i64,
    ) -> Result<BoardMember> {
        self.conn
            .execute(
                "INSERT INTO board_members (board_internal_id, user_internal_id) VALUES (?1, ?2)",
                params![board_internal_id, user_internal_id],
            )
            .context("Failed to insert board member")?;
        self.conn
            .query_row(
                "SELECT board_internal_id, user_internal_id, joined_at FROM board_members
                 WHERE board_internal_id = ?1 AND user_internal_id = ?2",
                params![board_internal_id, user_internal_id],
                |row| {
                    Ok(BoardMember {
                        board_internal_id: row.get(0)?,
                        user_internal_id: row.get(1)?,
                        joined_at: row.get(2)?,
                    })
                },
            )
            .context("Board member not found after insert")
    }

    pub fn list_board_members(&self, board_internal_id: i64) -> Result<Vec<BoardMember>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT board_internal_id, user_internal_id, joined_at FROM board_members
                 WHERE board_internal_id = ?1 ORDER BY joined_at, user_internal_id",
            )
            .context("Failed to prepare list_board_members")?;
        let rows = stmt
            .query_map(params![board_internal_id], |row| {
                Ok(BoardMember {
                    board_internal_id: row.get(0)?,
                    user_internal_id: row.get(1)?,
                    joined_at: row.get(2)?,
                })
            })
            .context("Failed to query board members")?;
        let mut members = Vec::new();
        for row in rows {
            members.push(row.context("Failed to read board member row")?);
        }
        Ok(members)
    }

    // ── Lists and ordering ────────────────────────────────────────────

    /// Create a list on a board and append it to the board's list order.
    pub fn create_list(&self, board_internal_id: i64, title: &str) -> Result<BoardList> {
        let public_id = Uuid::new_v4();
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;

        tx.execute(
            "INSERT INTO lists (public_id, board_internal_id, title) VALUES (?1, ?2, ?3)",
            params![public_id, board_internal_id, title],
        )
        .context("Failed to insert list")?;

        let mut order: UuidArray = tx
            .query_row(
                "SELECT list_order FROM list_positions WHERE board_internal_id = ?1",
                params![board_internal_id],
                |row| row.get(0),
            )
            .context("Failed to read list order")?;
        order.push(public_id);
        tx.execute(
            "UPDATE list_positions SET list_order = ?1 WHERE board_internal_id = ?2",
            params![order, board_internal_id],
        )
        .context("Failed to update list order")?;

        tx.commit().context("Failed to commit list creation")?;
        self.conn
            .query_row(
                "SELECT internal_id, public_id, board_internal_id, title, created_at FROM lists WHERE public_id = ?1",
                params![public_id],
                list_row,
            )
            .context("List not found after insert")
    }

    /// All lists of a board in creation order.
    pub fn list_lists(&self, board_internal_id: i64) -> Result<Vec<BoardList>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT internal_id, public_id, board_internal_id, title, created_at
                 FROM lists WHERE board_internal_id = ?1 ORDER BY internal_id",
            )
            .context("Failed to prepare list_lists")?;
        let rows = stmt
            .query_map(params![board_internal_id], list_row)
            .context("Failed to query lists")?;
        let mut lists = Vec::new();
        for row in rows {
            lists.push(row.context("Failed to read list row")?);
        }
        Ok(lists)
    }

    /// All lists of a board in display order. Lists missing from the stored
    /// order follow the ordered ones, in creation order.
    pub fn list_lists_ordered(&self, board_internal_id: i64) -> Result<Vec<BoardList>> {
        let position = self.get_list_position(board_internal_id)?;
        let mut rank: HashMap<Uuid, usize> = HashMap::new();
        for (i, id) in position.list_order.iter().enumerate() {
            rank.entry(*id).or_insert(i);
        }
        let mut lists = self.list_lists(board_internal_id)?;
        lists.sort_by_key(|l| rank.get(&l.public_id).copied().unwrap_or(usize::MAX));
        Ok(lists)
    }

    pub fn get_list_position(&self, board_internal_id: i64) -> Result<ListPosition> {
        self.conn
            .query_row(
                "SELECT internal_id, public_id, board_internal_id, list_order
                 FROM list_positions WHERE board_internal_id = ?1",
                params![board_internal_id],
                |row| {
                    Ok(ListPosition {
                        internal_id: row.get(0)?,
                        public_id: row.get(1)?,
                        board_internal_id: row.get(2)?,
                        list_order: row.get(3)?,
                    })
                },
            )
            .with_context(|| format!("Failed to read list position for board {}", board_internal_id))
    }

    pub fn set_list_order(&self, board_internal_id: i64, order: &UuidArray) -> Result<ListPosition> {
        let count = self
            .conn
            .execute(
                "UPDATE list_positions SET list_order = ?1 WHERE board_internal_id = ?2",
                params![order, board_internal_id],
            )
            .context("Failed to update list order")?;
        if count == 0 {
            anyhow::bail!("No list position for board {}", board_internal_id);
        }
        self.get_list_position(board_internal_id)
    }
}

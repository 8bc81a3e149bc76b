//! SQLite conversation log.
//!
//! An append-only record of every chat message, queried by user and by
//! free-text search. The schema mirrors [`ConversationTurn`]:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS conversations (
//!     id        INTEGER PRIMARY KEY AUTOINCREMENT,
//!     user_id   TEXT    NOT NULL,
//!     character TEXT    NOT NULL,
//!     role      TEXT    NOT NULL,
//!     content   TEXT    NOT NULL,
//!     anger     INTEGER NOT NULL,
//!     sadness   INTEGER NOT NULL,
//!     joy       INTEGER NOT NULL,
//!     timestamp TEXT    NOT NULL
//! );
//! ```
//!
//! Timestamps are stored as fixed-width UTC RFC 3339 strings, so ordering
//! by the text column is chronological. Ties fall back to insertion order.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, params};
use tracing::{debug, info};

use crate::config::PersistenceConfig;
use crate::error::{MoodzError, Result};
use crate::types::{ConversationTurn, Role};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS conversations (
        id        INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id   TEXT    NOT NULL,
        character TEXT    NOT NULL,
        role      TEXT    NOT NULL,
        content   TEXT    NOT NULL,
        anger     INTEGER NOT NULL,
        sadness   INTEGER NOT NULL,
        joy       INTEGER NOT NULL,
        timestamp TEXT    NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_conversations_user
        ON conversations (user_id, character, timestamp);";

const COLUMNS: &str = "user_id, character, role, content, anger, sadness, joy, timestamp";

/// Raw row as read from SQLite, before role/timestamp parsing.
type RawRow = (String, String, String, String, u8, u8, u8, String);

fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_row(row: RawRow) -> Result<ConversationTurn> {
    let (user_id, character, role, content, anger, sadness, joy, ts) = row;
    let timestamp = DateTime::parse_from_rfc3339(&ts)
        .map_err(|e| MoodzError::Serialization(format!("bad timestamp '{ts}': {e}")))?
        .with_timezone(&Utc);
    Ok(ConversationTurn {
        user_id,
        character,
        role: role.parse::<Role>()?,
        content,
        anger,
        sadness,
        joy,
        timestamp,
    })
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

/// Escape `%`, `_` and `\` so `term` matches literally inside `LIKE`.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn insert_turn(conn: &Connection, turn: &ConversationTurn) -> Result<i64> {
    conn.execute(
        &format!("INSERT INTO conversations ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
        params![
            turn.user_id,
            turn.character,
            turn.role.as_str(),
            turn.content,
            turn.anger,
            turn.sadness,
            turn.joy,
            encode_timestamp(&turn.timestamp),
        ],
    )?;
    let id = conn.last_insert_rowid();
    debug!(
        id,
        user = %turn.user_id,
        character = %turn.character,
        role = %turn.role,
        "Appended conversation turn"
    );
    Ok(id)
}

/// Handle to the SQLite conversation log.
///
/// The connection sits behind a mutex so one log can be shared by
/// reference between sessions.
///
/// ```no_run
/// # use moodz_core::history::ConversationLog;
/// # use moodz_core::config::PersistenceConfig;
/// # use moodz_core::types::ConversationTurn;
/// let log = ConversationLog::open("chat_history.db", &PersistenceConfig::default())?;
/// log.append(&ConversationTurn::user("ada", "Holmes", "Good evening."))?;
/// let past = log.history("ada")?;
/// # Ok::<(), moodz_core::error::MoodzError>(())
/// ```
pub struct ConversationLog {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl std::fmt::Debug for ConversationLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationLog")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl ConversationLog {
    /// Open (or create) the log at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`MoodzError::Database`] on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &PersistenceConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(&db_path, flags)?;

        if config.wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;

        info!(
            path = %db_path.display(),
            wal = config.wal_mode,
            "Conversation log opened"
        );

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    /// Open an in-memory log (useful for tests).
    ///
    /// # Errors
    ///
    /// Returns [`MoodzError::Database`] on SQLite failures.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// Append one turn. Returns the new row id.
    ///
    /// # Errors
    ///
    /// Returns [`MoodzError::Database`] on SQLite failures.
    pub fn append(&self, turn: &ConversationTurn) -> Result<i64> {
        let conn = self.conn.lock();
        insert_turn(&conn, turn)
    }

    /// Append a user turn and the assistant reply to it as one unit.
    ///
    /// Both rows are written in a single transaction; if either insert
    /// fails, neither is stored. Returns the two row ids.
    ///
    /// # Errors
    ///
    /// Returns [`MoodzError::Database`] on SQLite failures.
    pub fn append_exchange(
        &self,
        user: &ConversationTurn,
        assistant: &ConversationTurn,
    ) -> Result<(i64, i64)> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let user_id = insert_turn(&tx, user)?;
        let assistant_id = insert_turn(&tx, assistant)?;
        tx.commit()?;
        Ok((user_id, assistant_id))
    }

    fn query(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<ConversationTurn>> {
        let start = Instant::now();
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(sql)?;
        let raw = stmt
            .query_map(params, read_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        drop(stmt);
        drop(conn);

        let turns = raw
            .into_iter()
            .map(decode_row)
            .collect::<Result<Vec<_>>>()?;
        debug!(
            rows = turns.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Conversation query"
        );
        Ok(turns)
    }

    /// Every turn for `user_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`MoodzError::Database`] or [`MoodzError::Serialization`].
    pub fn history(&self, user_id: &str) -> Result<Vec<ConversationTurn>> {
        self.query(
            &format!(
                "SELECT {COLUMNS} FROM conversations WHERE user_id = ?1 ORDER BY timestamp, id"
            ),
            params![user_id],
        )
    }

    /// The last `limit` turns between `user_id` and `character`, oldest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`MoodzError::Database`] or [`MoodzError::Serialization`].
    pub fn recent_with(
        &self,
        user_id: &str,
        character: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut turns = self.query(
            &format!(
                "SELECT {COLUMNS} FROM conversations
                 WHERE user_id = ?1 AND character = ?2
                 ORDER BY timestamp DESC, id DESC LIMIT ?3"
            ),
            params![user_id, character, limit],
        )?;
        turns.reverse();
        Ok(turns)
    }

    /// Turns whose `user_id` or `content` contains `term` (ASCII
    /// case-insensitive), oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`MoodzError::Database`] or [`MoodzError::Serialization`].
    pub fn search(&self, term: &str) -> Result<Vec<ConversationTurn>> {
        let pattern = like_pattern(term);
        self.query(
            &format!(
                "SELECT {COLUMNS} FROM conversations
                 WHERE user_id LIKE ?1 ESCAPE '\\' OR content LIKE ?1 ESCAPE '\\'
                 ORDER BY timestamp, id"
            ),
            params![pattern],
        )
    }

    /// Total number of stored turns.
    ///
    /// # Errors
    ///
    /// Returns [`MoodzError::Database`] on SQLite failures.
    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM conversations", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Whether the log holds no turns.
    ///
    /// # Errors
    ///
    /// Returns [`MoodzError::Database`] on SQLite failures.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Copy the log to `dest_path` using SQLite's online-backup API.
    ///
    /// # Errors
    ///
    /// Returns [`MoodzError::Database`] on SQLite failures.
    pub fn backup<P: AsRef<Path>>(&self, dest_path: P) -> Result<()> {
        let start = Instant::now();
        let conn = self.conn.lock();
        let mut dest = Connection::open(dest_path.as_ref())?;
        let backup = rusqlite::backup::Backup::new(&conn, &mut dest)?;
        backup.run_to_completion(256, std::time::Duration::from_millis(50), None)?;

        info!(
            dest = %dest_path.as_ref().display(),
            elapsed_ms = start.elapsed().as_millis(),
            "Conversation log backup completed"
        );
        Ok(())
    }

    /// Return the path to the database file (or `:memory:`).
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Run an integrity check on the database.
    ///
    /// # Errors
    ///
    /// Returns [`MoodzError::Database`] if the check query itself fails.
    pub fn integrity_check(&self) -> Result<bool> {
        let result: String = self
            .conn
            .lock()
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }
}

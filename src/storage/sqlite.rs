//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::crawler::{CrawlResult, ExtractedRecord, OutcomeStatus, Strategy};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus, SessionRecord, StoredOutcome};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str = "id, session_id, started_at, finished_at, status, strategy, \
     total_requested, total_completed, credits_used, schema_json, inferred, error_message";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = init_database(path)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn run_status(&self, run_id: i64) -> StorageResult<RunStatus> {
        let status: Option<String> = self
            .conn
            .query_row(
                "SELECT status FROM crawl_runs WHERE id = ?1",
                params![run_id],
                |row| row.get(0),
            )
            .optional()?;

        status
            .map(|s| RunStatus::from_db_string(&s).unwrap_or(RunStatus::Running))
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn ensure_running(&self, run_id: i64) -> StorageResult<()> {
        match self.run_status(run_id)? {
            RunStatus::Running => Ok(()),
            other => Err(StorageError::RunNotRunning {
                run_id,
                status: other.to_db_string().to_string(),
            }),
        }
    }
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<SessionRecord> {
    Ok(SessionRecord {
        id: row.get(0)?,
        root_url: row.get(1)?,
        config_hash: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    let schema_json: Option<String> = row.get(9)?;

    Ok(RunRecord {
        id: row.get(0)?,
        session_id: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Running),
        strategy: row
            .get::<_, Option<String>>(5)?
            .and_then(|s| Strategy::from_db_string(&s)),
        total_requested: row.get::<_, i64>(6)?.max(0) as u64,
        total_completed: row.get::<_, i64>(7)?.max(0) as u64,
        credits_used: row.get::<_, i64>(8)?.max(0) as u64,
        schema: schema_json.and_then(|json| serde_json::from_str(&json).ok()),
        inferred: row.get(10)?,
        error_message: row.get(11)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Session Management =====

    fn create_session(&mut self, root_url: &str, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO sessions (root_url, config_hash, created_at) VALUES (?1, ?2, ?3)",
            params![root_url, config_hash, now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_session(&self, session_id: i64) -> StorageResult<SessionRecord> {
        self.conn
            .query_row(
                "SELECT id, root_url, config_hash, created_at FROM sessions WHERE id = ?1",
                params![session_id],
                session_from_row,
            )
            .optional()?
            .ok_or(StorageError::SessionNotFound(session_id))
    }

    fn get_latest_session(&self) -> StorageResult<Option<SessionRecord>> {
        let session = self
            .conn
            .query_row(
                "SELECT id, root_url, config_hash, created_at FROM sessions ORDER BY id DESC LIMIT 1",
                [],
                session_from_row,
            )
            .optional()?;
        Ok(session)
    }

    fn add_discovered_urls(&mut self, session_id: i64, urls: &[String]) -> StorageResult<usize> {
        self.get_session(session_id)?;

        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        let mut added = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO discovered_urls (session_id, url, discovered_at) VALUES (?1, ?2, ?3)",
            )?;
            for url in urls {
                added += stmt.execute(params![session_id, url, now])?;
            }
        }
        tx.commit()?;

        Ok(added)
    }

    fn load_session_urls(&self, session_id: i64) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url FROM discovered_urls WHERE session_id = ?1 ORDER BY id")?;

        let urls = stmt
            .query_map(params![session_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(urls)
    }

    fn add_expanded_paths(&mut self, session_id: i64, paths: &[String]) -> StorageResult<usize> {
        self.get_session(session_id)?;

        let tx = self.conn.transaction()?;
        let mut added = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO expanded_paths (session_id, path) VALUES (?1, ?2)",
            )?;
            for path in paths {
                added += stmt.execute(params![session_id, path])?;
            }
        }
        tx.commit()?;

        Ok(added)
    }

    fn load_expanded_paths(&self, session_id: i64) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT path FROM expanded_paths WHERE session_id = ?1 ORDER BY path")?;

        let paths = stmt
            .query_map(params![session_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(paths)
    }

    // ===== Run Management =====

    fn create_run(&mut self, session_id: Option<i64>) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO crawl_runs (session_id, started_at, status) VALUES (?1, ?2, ?3)",
            params![session_id, now, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM crawl_runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM crawl_runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    fn get_latest_completed_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM crawl_runs WHERE status = ?1 ORDER BY id DESC LIMIT 1",
                    RUN_COLUMNS
                ),
                params![RunStatus::Completed.to_db_string()],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    fn complete_run(&mut self, run_id: i64, result: &CrawlResult) -> StorageResult<()> {
        self.ensure_running(run_id)?;

        let schema_json = serde_json::to_string(&result.schema)?;
        let record_rows = result
            .records
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;
        let now = Utc::now().to_rfc3339();

        let tx = self.conn.transaction()?;
        {
            let mut insert_record = tx.prepare(
                "INSERT INTO records (run_id, position, record_json) VALUES (?1, ?2, ?3)",
            )?;
            for (position, json) in record_rows.iter().enumerate() {
                insert_record.execute(params![run_id, position as i64, json])?;
            }

            let mut insert_outcome = tx.prepare(
                "INSERT INTO page_outcomes (run_id, position, url, status, error_message)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (position, outcome) in result.outcomes.iter().enumerate() {
                insert_outcome.execute(params![
                    run_id,
                    position as i64,
                    outcome.url,
                    outcome.status.to_db_string(),
                    outcome.error,
                ])?;
            }

            tx.execute(
                "UPDATE crawl_runs SET
                    status = ?1, finished_at = ?2, strategy = ?3, total_requested = ?4,
                    total_completed = ?5, credits_used = ?6, schema_json = ?7, inferred = ?8
                 WHERE id = ?9",
                params![
                    RunStatus::Completed.to_db_string(),
                    now,
                    result.strategy.to_db_string(),
                    result.total_requested as i64,
                    result.total_completed as i64,
                    result.credits_used as i64,
                    schema_json,
                    result.inferred_schema.is_some(),
                    run_id,
                ],
            )?;
        }
        tx.commit()?;

        Ok(())
    }

    fn fail_run(&mut self, run_id: i64, message: &str) -> StorageResult<()> {
        self.ensure_running(run_id)?;

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE crawl_runs SET status = ?1, finished_at = ?2, error_message = ?3 WHERE id = ?4",
            params![RunStatus::Failed.to_db_string(), now, message, run_id],
        )?;
        Ok(())
    }

    // ===== Run Contents =====

    fn load_records(&self, run_id: i64) -> StorageResult<Vec<ExtractedRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT record_json FROM records WHERE run_id = ?1 ORDER BY position")?;

        let rows = stmt
            .query_map(params![run_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let records = rows
            .iter()
            .map(|json| serde_json::from_str(json))
            .collect::<Result<Vec<ExtractedRecord>, _>>()?;

        Ok(records)
    }

    fn load_outcomes(&self, run_id: i64) -> StorageResult<Vec<StoredOutcome>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, status, error_message FROM page_outcomes WHERE run_id = ?1 ORDER BY position",
        )?;

        let outcomes = stmt
            .query_map(params![run_id], |row| {
                Ok(StoredOutcome {
                    url: row.get(0)?,
                    status: OutcomeStatus::from_db_string(&row.get::<_, String>(1)?)
                        .unwrap_or(OutcomeStatus::Skipped),
                    error_message: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(outcomes)
    }

    // ===== Statistics =====

    fn count_outcomes_by_status(&self, run_id: i64) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT status, COUNT(*) FROM page_outcomes WHERE run_id = ?1 GROUP BY status ORDER BY status",
        )?;

        let counts = stmt
            .query_map(params![run_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?.max(0) as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }

    fn count_runs(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM crawl_runs", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

/// Opens a database file with WAL pragmas and an initialized schema
pub fn init_database(path: &Path) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open(path)?;

    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
    ",
    )?;

    initialize_schema(&conn)?;

    Ok(conn)
}

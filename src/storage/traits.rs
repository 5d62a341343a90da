//! The `Storage` seam and its error type

use crate::crawler::{CrawlResult, ExtractedRecord};
use crate::storage::{RunRecord, SessionRecord, StoredOutcome};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Session not found: {0}")]
    SessionNotFound(i64),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Run {run_id} is {status}, expected running")]
    RunNotRunning { run_id: i64, status: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Covers mapping sessions, their discovered URLs, crawl runs and the
/// records and per-URL outcomes each completed run produced.
pub trait Storage {
    // ===== Session Management =====

    /// Creates a new mapping session
    ///
    /// # Arguments
    ///
    /// * `root_url` - The URL the session was mapped from
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created session
    fn create_session(&mut self, root_url: &str, config_hash: &str) -> StorageResult<i64>;

    /// Gets a session by ID
    fn get_session(&self, session_id: i64) -> StorageResult<SessionRecord>;

    /// Gets the most recent session
    fn get_latest_session(&self) -> StorageResult<Option<SessionRecord>>;

    /// Adds discovered URLs to a session, ignoring ones already stored
    ///
    /// # Returns
    ///
    /// The number of URLs that were new to the session
    fn add_discovered_urls(&mut self, session_id: i64, urls: &[String]) -> StorageResult<usize>;

    /// Loads every URL of a session in discovery order
    fn load_session_urls(&self, session_id: i64) -> StorageResult<Vec<String>>;

    /// Records tree node paths as expanded, ignoring ones already stored
    fn add_expanded_paths(&mut self, session_id: i64, paths: &[String]) -> StorageResult<usize>;

    /// Loads a session's expanded node paths
    fn load_expanded_paths(&self, session_id: i64) -> StorageResult<Vec<String>>;

    // ===== Run Management =====

    /// Creates a new crawl run in the `running` state
    fn create_run(&mut self, session_id: Option<i64>) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Gets the most recent completed run
    fn get_latest_completed_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Stores a crawl result and marks the run completed
    ///
    /// Records and outcomes are written in one transaction, so a run is either
    /// completed with all of its records or still running with none.
    fn complete_run(&mut self, run_id: i64, result: &CrawlResult) -> StorageResult<()>;

    /// Marks a run failed; no records are stored for it
    fn fail_run(&mut self, run_id: i64, message: &str) -> StorageResult<()>;

    // ===== Run Contents =====

    /// Loads a run's records in their original order
    fn load_records(&self, run_id: i64) -> StorageResult<Vec<ExtractedRecord>>;

    /// Loads a run's per-URL outcomes in request order
    fn load_outcomes(&self, run_id: i64) -> StorageResult<Vec<StoredOutcome>>;

    // ===== Statistics =====

    /// Counts outcomes of a run grouped by status string
    fn count_outcomes_by_status(&self, run_id: i64) -> StorageResult<Vec<(String, u64)>>;

    /// Counts all runs
    fn count_runs(&self) -> StorageResult<u64>;
}

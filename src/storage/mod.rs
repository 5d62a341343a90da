//! Storage module for persisting sessions and crawl runs
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Mapping sessions and their discovered URLs
//! - Crawl runs with their records and per-URL outcomes

mod schema;
mod sqlite;
mod traits;

pub use schema::{initialize_schema, SCHEMA_SQL};
pub use sqlite::{init_database, SqliteStorage};
pub use traits::{Storage, StorageError, StorageResult};

use crate::crawler::{OutcomeStatus, Strategy};
use crate::schema::Schema;

use std::path::Path;

/// Opens the SQLite database at `path`, creating it and its tables if missing
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Represents a mapping session in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: i64,
    pub root_url: String,
    pub config_hash: String,
    pub created_at: String,
}

/// Represents a crawl run in the database
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub id: i64,
    pub session_id: Option<i64>,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub status: RunStatus,
    pub strategy: Option<Strategy>,
    pub total_requested: u64,
    pub total_completed: u64,
    pub credits_used: u64,
    pub schema: Option<Schema>,
    /// The schema was inferred from a sample page
    pub inferred: bool,
    pub error_message: Option<String>,
}

/// A stored per-URL outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredOutcome {
    pub url: String,
    pub status: OutcomeStatus,
    pub error_message: Option<String>,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    /// Converts to database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    /// Parses from database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(RunStatus::Running),
            "completed" => Some(RunStatus::Completed),
            "failed" => Some(RunStatus::Failed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_conversion() {
        assert_eq!(RunStatus::Running.to_db_string(), "running");
        assert_eq!(RunStatus::Completed.to_db_string(), "completed");
        assert_eq!(RunStatus::Failed.to_db_string(), "failed");

        assert_eq!(
            RunStatus::from_db_string("running"),
            Some(RunStatus::Running)
        );
        assert_eq!(
            RunStatus::from_db_string("completed"),
            Some(RunStatus::Completed)
        );
        assert_eq!(RunStatus::from_db_string("failed"), Some(RunStatus::Failed));
        assert_eq!(RunStatus::from_db_string("interrupted"), None);
    }

    #[test]
    fn test_open_storage_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harvest.db");

        let storage = open_storage(&path);
        assert!(storage.is_ok());
        assert!(path.exists());
    }
}

//! Statistics generation from the run database
//!
//! This module provides functionality for summarizing a stored crawl run
//! and displaying it on the command line.

use crate::crawler::{OutcomeStatus, Strategy};
use crate::storage::{RunStatus, Storage, StorageResult};

/// Summary of one crawl run
#[derive(Debug, Clone, PartialEq)]
pub struct RunStatistics {
    pub run_id: i64,
    pub status: RunStatus,
    pub strategy: Option<Strategy>,

    /// Distinct URLs the crawl was asked for
    pub total_requested: u64,

    /// Pages that produced a record
    pub total_completed: u64,

    /// Pages dropped after a fetch or extraction failure
    pub skipped: u64,

    pub credits_used: u64,

    /// Field names of the schema the run extracted against
    pub schema_fields: Vec<String>,

    /// The schema was inferred rather than supplied
    pub inferred: bool,

    /// Outcome counts keyed by status string
    pub outcomes: Vec<(String, u64)>,

    /// Skip reasons with how many pages hit each one, most common first
    pub skip_reasons: Vec<(String, u64)>,

    pub error_message: Option<String>,
}

impl RunStatistics {
    /// Fraction of requested pages that yielded a record, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_requested == 0 {
            return 0.0;
        }
        (self.total_completed as f64 / self.total_requested as f64) * 100.0
    }
}

/// Loads statistics for one run
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `run_id` - The run to summarize
///
/// # Returns
///
/// * `Ok(RunStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Run missing or query failed
pub fn load_statistics(storage: &dyn Storage, run_id: i64) -> StorageResult<RunStatistics> {
    let run = storage.get_run(run_id)?;
    let outcomes = storage.count_outcomes_by_status(run_id)?;

    let skipped = outcomes
        .iter()
        .filter(|(status, _)| status == OutcomeStatus::Skipped.to_db_string())
        .map(|(_, count)| *count)
        .sum();

    let mut skip_reasons: Vec<(String, u64)> = Vec::new();
    for outcome in storage.load_outcomes(run_id)? {
        if outcome.status != OutcomeStatus::Skipped {
            continue;
        }
        let reason = outcome
            .error_message
            .unwrap_or_else(|| "unknown".to_string());
        match skip_reasons.iter_mut().find(|(r, _)| *r == reason) {
            Some((_, count)) => *count += 1,
            None => skip_reasons.push((reason, 1)),
        }
    }
    // Stable sort keeps first-seen order among ties
    skip_reasons.sort_by(|a, b| b.1.cmp(&a.1));

    Ok(RunStatistics {
        run_id,
        status: run.status,
        strategy: run.strategy,
        total_requested: run.total_requested,
        total_completed: run.total_completed,
        skipped,
        credits_used: run.credits_used,
        schema_fields: run
            .schema
            .map(|schema| schema.properties.keys().cloned().collect())
            .unwrap_or_default(),
        inferred: run.inferred,
        outcomes,
        skip_reasons,
        error_message: run.error_message,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Crawl Run {} ===\n", stats.run_id);

    println!("Overview:");
    println!("  Status: {}", stats.status.to_db_string());
    if let Some(strategy) = stats.strategy {
        println!("  Strategy: {}", strategy.to_db_string());
    }
    println!("  Pages requested: {}", stats.total_requested);
    println!("  Records extracted: {}", stats.total_completed);
    println!("  Pages skipped: {}", stats.skipped);
    println!("  Credits used: {}", stats.credits_used);
    println!();

    if !stats.schema_fields.is_empty() {
        let origin = if stats.inferred { "inferred" } else { "supplied" };
        println!("Schema ({}):", origin);
        println!("  {}", stats.schema_fields.join(", "));
        println!();
    }

    if !stats.skip_reasons.is_empty() {
        println!("Skip Reasons:");
        for (reason, count) in &stats.skip_reasons {
            println!("  {}: {}", reason, count);
        }
        println!();
    }

    if let Some(message) = &stats.error_message {
        println!("Error: {}", message);
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages extracted)",
        stats.success_rate(),
        stats.total_completed,
        stats.total_requested
    );
}

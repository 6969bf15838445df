// strings-scanner - app/worker.rs
//
// Batch processing: classify every string in a task and report each
// (string, heuristic) match.
//
// Architecture:
//   - Matches are collected first (pure), then reported.
//   - Reports run sequentially, or on a dedicated rayon pool when
//     `report_parallelism > 1`. Either way `process` returns only after
//     every report call has finished.
//   - A failed report never stops later reports; `FailurePolicy` decides
//     whether failures reach the caller.

use crate::app::reporter::Reporter;
use crate::core::fingerprint::fingerprint;
use crate::core::heuristics::HeuristicSet;
use crate::core::model::{HeuristicName, MatchRecord, ProcessOutcome, StringBatch, Task};
use crate::util::constants;
use crate::util::error::{ReportingFailure, WorkerError};
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

// =============================================================================
// Policies
// =============================================================================

/// What a failed report call means for the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log the failure and treat the batch as successful.
    #[default]
    DropAndContinue,
    /// Attempt every report, then fail the batch if any report failed.
    CollectAndSurface,
}

impl FailurePolicy {
    /// Parse a config value: "drop" or "collect" (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "drop" | "drop_and_continue" => Some(Self::DropAndContinue),
            "collect" | "collect_and_surface" => Some(Self::CollectAndSurface),
            _ => None,
        }
    }
}

/// Whether repeated (value, heuristic) pairs within one batch are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// One report per occurrence.
    #[default]
    ReportAll,
    /// One report per distinct (value, heuristic) pair per batch.
    Deduplicate,
}

/// Tunables for a worker instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerOptions {
    pub failure_policy: FailurePolicy,
    pub duplicate_policy: DuplicatePolicy,
    /// Concurrent report calls per batch. 1 = sequential.
    pub report_parallelism: usize,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            duplicate_policy: DuplicatePolicy::default(),
            report_parallelism: constants::DEFAULT_REPORT_PARALLELISM,
        }
    }
}

// =============================================================================
// Worker
// =============================================================================

/// Classifies string batches and reports matches through `R`.
///
/// Holds no per-task state: the heuristic set and reporter are fixed at
/// construction and shared read-only across invocations.
pub struct StringClassificationWorker<R: Reporter> {
    heuristics: Arc<HeuristicSet>,
    reporter: R,
    options: WorkerOptions,
    pool: Option<rayon::ThreadPool>,
}

impl<R: Reporter> StringClassificationWorker<R> {
    pub fn new(heuristics: Arc<HeuristicSet>, reporter: R) -> Self {
        Self::with_options(heuristics, reporter, WorkerOptions::default())
    }

    pub fn with_options(
        heuristics: Arc<HeuristicSet>,
        reporter: R,
        options: WorkerOptions,
    ) -> Self {
        let threads = options
            .report_parallelism
            .clamp(1, constants::MAX_REPORT_PARALLELISM);

        let pool = if threads > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|i| format!("report-{i}"))
                .build()
            {
                Ok(pool) => Some(pool),
                Err(e) => {
                    tracing::warn!(
                        threads,
                        error = %e,
                        "Failed to build report thread pool; reporting sequentially"
                    );
                    None
                }
            }
        } else {
            None
        };

        tracing::debug!(
            heuristics = heuristics.len(),
            failure_policy = ?options.failure_policy,
            duplicate_policy = ?options.duplicate_policy,
            report_threads = pool.as_ref().map_or(1, |p| p.current_num_threads()),
            "Worker created"
        );

        Self {
            heuristics,
            reporter,
            options,
            pool,
        }
    }

    pub fn heuristics(&self) -> &HeuristicSet {
        &self.heuristics
    }

    pub fn options(&self) -> &WorkerOptions {
        &self.options
    }

    /// Process one task: validate its payload, then classify and report.
    ///
    /// A malformed payload fails before any report is sent.
    pub fn process(&self, task: &Task) -> Result<ProcessOutcome, WorkerError> {
        let batch = StringBatch::from_payload(&task.payload)?;
        self.process_batch(&batch)
    }

    /// Classify and report an already-validated batch.
    pub fn process_batch(&self, batch: &StringBatch) -> Result<ProcessOutcome, WorkerError> {
        let (records, matches, suppressed) = self.collect_matches(batch);

        tracing::debug!(
            sample = %batch.sample_id,
            strings = batch.strings.len(),
            matches,
            suppressed,
            "Batch classified"
        );

        let results: Vec<Result<(), ReportingFailure>> = match &self.pool {
            Some(pool) => pool.install(|| {
                records
                    .par_iter()
                    .map(|record| self.reporter.report(record))
                    .collect()
            }),
            None => records
                .iter()
                .map(|record| self.reporter.report(record))
                .collect(),
        };

        let mut failures = Vec::new();
        for (record, result) in records.iter().zip(results) {
            match result {
                Ok(()) => tracing::debug!(
                    sample = %record.sample_id,
                    heuristic = %record.heuristic,
                    content_id = %record.content_id,
                    "Reported match"
                ),
                Err(e) => {
                    tracing::warn!(
                        sample = %record.sample_id,
                        heuristic = %record.heuristic,
                        error = %e,
                        "Report failed"
                    );
                    failures.push(e);
                }
            }
        }

        let outcome = ProcessOutcome {
            sample_id: batch.sample_id.clone(),
            strings_scanned: batch.strings.len(),
            matches,
            reported: records.len() - failures.len(),
            failed: failures.len(),
            suppressed_duplicates: suppressed,
        };

        if !failures.is_empty()
            && self.options.failure_policy == FailurePolicy::CollectAndSurface
        {
            return Err(WorkerError::PartialReportFailure {
                sample_id: batch.sample_id.clone(),
                attempted: records.len(),
                failures,
            });
        }

        Ok(outcome)
    }

    /// Build the match records for a batch, in string order then heuristic
    /// order. Returns (records, total matches, suppressed duplicates).
    pub fn collect_matches(&self, batch: &StringBatch) -> (Vec<MatchRecord>, usize, usize) {
        let mut records = Vec::new();
        let mut seen: HashSet<(&str, HeuristicName)> = HashSet::new();
        let mut matches = 0;
        let mut suppressed = 0;

        for value in &batch.strings {
            let names = self.heuristics.classify(value);
            if names.is_empty() {
                continue;
            }
            let content_id = fingerprint(value);

            for heuristic in names {
                matches += 1;
                if self.options.duplicate_policy == DuplicatePolicy::Deduplicate
                    && !seen.insert((value.as_str(), heuristic.clone()))
                {
                    suppressed += 1;
                    continue;
                }
                records.push(MatchRecord {
                    value: value.clone(),
                    content_id: content_id.clone(),
                    heuristic,
                    sample_id: batch.sample_id.clone(),
                });
            }
        }

        (records, matches, suppressed)
    }
}

// =============================================================================
// Tests
// =============================================================================

// strings-scanner - app/consumer.rs
//
// Task consumption loop. Routes each incoming task through the header
// filter and the worker, and turns every outcome into a `TaskStatus`.
// A bad task is failed on its own; it never stops the loop.

use crate::app::reporter::Reporter;
use crate::app::worker::StringClassificationWorker;
use crate::core::model::{ProcessOutcome, Task};
use crate::core::task::TaskFilter;
use crate::util::constants;
use crate::util::error::{MalformedTaskError, WorkerError};
use std::io::BufRead;
use std::time::Instant;

/// Final state of one task, as reported back to the transport.
#[derive(Debug)]
pub enum TaskStatus {
    /// The batch was processed. Individual reports may still have failed
    /// under the drop-and-continue policy; see the outcome counters.
    Completed(ProcessOutcome),
    /// The task's headers do not match this worker's filter.
    Skipped,
    /// The task could not be processed.
    Failed(WorkerError),
}

impl TaskStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Totals over one `run`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub reports_sent: usize,
    pub reports_failed: usize,
}

impl RunSummary {
    fn record(&mut self, status: &TaskStatus) {
        match status {
            TaskStatus::Completed(outcome) => {
                self.completed += 1;
                self.reports_sent += outcome.reported;
                self.reports_failed += outcome.failed;
            }
            TaskStatus::Skipped => self.skipped += 1,
            TaskStatus::Failed(WorkerError::PartialReportFailure {
                attempted,
                failures,
                ..
            }) => {
                self.failed += 1;
                self.reports_sent += attempted - failures.len();
                self.reports_failed += failures.len();
            }
            TaskStatus::Failed(_) => self.failed += 1,
        }
    }
}

/// Binds a worker to the routing filter it declares interest in.
pub struct TaskConsumer<R: Reporter> {
    worker: StringClassificationWorker<R>,
    filter: TaskFilter,
}

impl<R: Reporter> TaskConsumer<R> {
    /// Consumer with the default `type=feature, stage=raw, kind=strings` filter.
    pub fn new(worker: StringClassificationWorker<R>) -> Self {
        Self::with_filter(worker, TaskFilter::default())
    }

    pub fn with_filter(worker: StringClassificationWorker<R>, filter: TaskFilter) -> Self {
        Self { worker, filter }
    }

    pub fn worker(&self) -> &StringClassificationWorker<R> {
        &self.worker
    }

    /// Handle one task.
    pub fn handle(&self, task: &Task) -> TaskStatus {
        if !self.filter.matches(&task.headers) {
            tracing::debug!(headers = ?task.headers, "Task does not match filter; skipping");
            return TaskStatus::Skipped;
        }

        let started = Instant::now();
        match self.worker.process(task) {
            Ok(outcome) => {
                tracing::info!(
                    identity = constants::WORKER_IDENTITY,
                    sample = %outcome.sample_id,
                    strings = outcome.strings_scanned,
                    matches = outcome.matches,
                    reported = outcome.reported,
                    failed = outcome.failed,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Task completed"
                );
                TaskStatus::Completed(outcome)
            }
            Err(e) => {
                tracing::error!(
                    identity = constants::WORKER_IDENTITY,
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Task failed"
                );
                TaskStatus::Failed(e)
            }
        }
    }

    /// Consume tasks until the source is exhausted.
    ///
    /// Source-level decode errors are counted as failed tasks.
    pub fn run<I>(&self, tasks: I) -> RunSummary
    where
        I: IntoIterator<Item = Result<Task, MalformedTaskError>>,
    {
        let mut summary = RunSummary::default();

        for item in tasks {
            let status = match item {
                Ok(task) => self.handle(&task),
                Err(e) => {
                    tracing::error!(error = %e, "Could not decode task");
                    TaskStatus::Failed(WorkerError::Malformed(e))
                }
            };
            summary.record(&status);
        }

        tracing::info!(
            completed = summary.completed,
            skipped = summary.skipped,
            failed = summary.failed,
            reports_sent = summary.reports_sent,
            reports_failed = summary.reports_failed,
            "Task source exhausted"
        );

        summary
    }
}

// =============================================================================
// JSON-lines task source
// =============================================================================

/// Read tasks from `reader`, one JSON object per line.
///
/// Blank lines are ignored. Lines are numbered from 1. A line that is not
/// UTF-8 or not task JSON yields an error and reading continues; a failed
/// read yields one `Unreadable` error and ends the stream.
pub fn read_tasks_jsonl<B: BufRead>(
    reader: B,
) -> impl Iterator<Item = Result<Task, MalformedTaskError>> {
    JsonLinesTasks {
        reader,
        line: 0,
        buf: Vec::new(),
        done: false,
    }
}

struct JsonLinesTasks<B> {
    reader: B,
    line: usize,
    buf: Vec<u8>,
    done: bool,
}

impl<B: BufRead> Iterator for JsonLinesTasks<B> {
    type Item = Result<Task, MalformedTaskError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    self.line += 1;
                    if let Some(task) = self.decode_line() {
                        return Some(task);
                    }
                }
                Err(e) => {
                    self.done = true;
                    tracing::error!(line = self.line + 1, error = %e, "Failed reading task input");
                    return Some(Err(MalformedTaskError::Unreadable {
                        line: self.line + 1,
                        source: e,
                    }));
                }
            }
        }
        None
    }
}

impl<B> JsonLinesTasks<B> {
    /// Decode the buffered line; `None` for a blank line.
    fn decode_line(&mut self) -> Option<Result<Task, MalformedTaskError>> {
        let raw = std::mem::take(&mut self.buf);
        let text = match String::from_utf8(raw) {
            Ok(text) => text,
            Err(e) => {
                return Some(Err(MalformedTaskError::InvalidUtf8 {
                    line: self.line,
                    source: e,
                }))
            }
        };
        if text.trim().is_empty() {
            return None;
        }
        Some(
            serde_json::from_str::<Task>(&text).map_err(|e| MalformedTaskError::Decode {
                line: self.line,
                source: e,
            }),
        )
    }
}

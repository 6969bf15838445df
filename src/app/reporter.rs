// strings-scanner - app/reporter.rs
//
// Outbound reporting to the sample-metadata service.
//
// The worker is generic over `Reporter` so the HTTP client can be swapped
// for a recording double in tests. `HttpReporter` issues one blocking POST
// per match with a bounded global timeout; it never retries.

use crate::core::model::MatchRecord;
use crate::util::constants;
use crate::util::error::ReportingFailure;
use std::time::Duration;
use ureq::Agent;

/// Destination for match records.
///
/// Implementations must be shareable across threads: the worker may fan
/// reports out over a thread pool.
pub trait Reporter: Send + Sync {
    /// Deliver one match record. Errors are per-record; the caller decides
    /// whether they affect the batch.
    fn report(&self, record: &MatchRecord) -> Result<(), ReportingFailure>;
}

impl<R: Reporter + ?Sized> Reporter for &R {
    fn report(&self, record: &MatchRecord) -> Result<(), ReportingFailure> {
        (**self).report(record)
    }
}

impl<R: Reporter + ?Sized> Reporter for std::sync::Arc<R> {
    fn report(&self, record: &MatchRecord) -> Result<(), ReportingFailure> {
        (**self).report(record)
    }
}

// =============================================================================
// HTTP reporter
// =============================================================================

/// Reports matches with `POST {base_url}/sample/{sample_id}/string`.
pub struct HttpReporter {
    base_url: String,
    agent: Agent,
}

impl HttpReporter {
    /// Build a reporter for `base_url` with the given per-call timeout.
    /// A trailing `/` on `base_url` is ignored.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();

        tracing::debug!(
            base_url,
            timeout_ms = timeout.as_millis() as u64,
            "HTTP reporter configured"
        );

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full report URL for a sample.
    pub fn endpoint(&self, sample_id: &str) -> String {
        format!(
            "{}/{}/{sample_id}/{}",
            self.base_url,
            constants::REPORT_PATH_SAMPLE,
            constants::REPORT_PATH_STRING
        )
    }
}

impl Reporter for HttpReporter {
    fn report(&self, record: &MatchRecord) -> Result<(), ReportingFailure> {
        let url = self.endpoint(&record.sample_id);

        let mut response = self
            .agent
            .post(&url)
            .send_json(record.body())
            .map_err(|err| match err {
                ureq::Error::StatusCode(status) => ReportingFailure::Status {
                    url: url.clone(),
                    status,
                },
                other => ReportingFailure::Transport {
                    url: url.clone(),
                    source: other,
                },
            })?;

        // The body is a liveness signal only: it must be JSON when present,
        // but its content is not interpreted.
        let body = response.body_mut().read_to_string().map_err(|err| {
            ReportingFailure::InvalidResponse {
                url: url.clone(),
                reason: format!("failed reading response body: {err}"),
            }
        })?;

        if !body.trim().is_empty() {
            serde_json::from_str::<serde_json::Value>(&body).map_err(|err| {
                ReportingFailure::InvalidResponse {
                    url: url.clone(),
                    reason: format!("response is not JSON: {err}"),
                }
            })?;
        }

        Ok(())
    }
}

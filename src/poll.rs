//! Result Poller
//!
//! One-shot retrieval of the result batch for a submitted job. The
//! backend signals "still running" by omitting the `images` field; a
//! present field (even an empty array) means the batch is complete.
//!
//! Query responses are cached under a tag derived from the job id, and a
//! Pending observation always invalidates that tag. Without the
//! invalidation, a cached pending response would keep being served even
//! after the backend finishes. There is no timer and no automatic retry:
//! repeated polling is driven entirely by external re-invocation.

use std::collections::HashMap;

use reqwest::Client;
use tracing::debug;

use crate::error::QueryError;
use crate::types::{ImageResult, QueryResponse};

/// Outcome of a single poll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// The job is not yet complete. Terminal for this render pass; the
    /// caller is responsible for causing a later re-poll.
    Pending,
    /// The job is complete. The batch may be empty.
    Complete(Vec<ImageResult>),
}

/// Human-readable notice shown while a job is pending.
pub const PENDING_NOTICE: &str =
    "Generation in progress (1 min per prompt). Check again later.";

/// Cache of query responses, keyed by a tag derived from the job id.
#[derive(Default)]
pub struct ResultCache {
    entries: HashMap<String, QueryResponse>,
}

/// The cache tag for a job id.
pub fn batch_tag(id: &str) -> String {
    format!("get-batch-result{}", id)
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&QueryResponse> {
        self.entries.get(&batch_tag(id))
    }

    pub fn insert(&mut self, id: &str, response: QueryResponse) {
        self.entries.insert(batch_tag(id), response);
    }

    /// Drop any cached response for this job's tag.
    pub fn invalidate(&mut self, id: &str) {
        self.entries.remove(&batch_tag(id));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(&batch_tag(id))
    }
}

/// Client for the proxy's query path.
pub struct Poller {
    base_url: String,
    http: Client,
}

impl Poller {
    /// Create a poller pointed at the proxy's base URL.
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            http: Client::new(),
        }
    }

    /// Fetch the result batch for `id` once and resolve its state.
    ///
    /// A cached response is served without a network call. Only a 2xx
    /// response whose body parses as JSON but lacks `images` counts as
    /// Pending; transport failures, non-2xx statuses, and unparseable
    /// bodies are `QueryError`s, visibly distinct from "still running".
    pub async fn poll(
        &self,
        id: &str,
        cache: &mut ResultCache,
    ) -> Result<PollOutcome, QueryError> {
        let response = match cache.get(id) {
            Some(cached) => {
                debug!(job_id = %id, "serving cached query response");
                cached.clone()
            }
            None => {
                let fetched = self.fetch(id).await?;
                cache.insert(id, fetched.clone());
                fetched
            }
        };

        match response.images {
            None => {
                // Evict the pending response so the next visit re-queries
                // instead of replaying it after the backend has finished.
                cache.invalidate(id);
                Ok(PollOutcome::Pending)
            }
            Some(batch) => Ok(PollOutcome::Complete(batch)),
        }
    }

    async fn fetch(&self, id: &str) -> Result<QueryResponse, QueryError> {
        let url = format!("{}/api/query/{}", self.base_url, urlencoding::encode(id));
        let response = self.http.post(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QueryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

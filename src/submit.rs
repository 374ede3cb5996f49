//! Request Submitter
//!
//! Sends a validated `ExperimentRequest` to the proxy's generate
//! endpoint and yields the backend-issued job id. Failures never touch
//! the job registry, and no retry is performed; a failed submission
//! requires a new user-initiated resubmission.

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::info;

use crate::error::SubmissionError;
use crate::registry::{JobRegistry, RegistryStore};
use crate::types::{ExperimentRequest, GenerateResponse, JobId};

/// Client for the generate endpoint.
pub struct Submitter {
    base_url: String,
    http: Client,
}

impl Submitter {
    /// Create a submitter pointed at the proxy's base URL.
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            http: Client::new(),
        }
    }

    /// Submit `request` and return the backend's job id.
    ///
    /// Precondition: the payload has passed validation. Fails with
    /// `SubmissionError` if the endpoint is unreachable, returns non-2xx,
    /// or returns a body without a `requestId`.
    pub async fn submit(&self, request: &ExperimentRequest) -> Result<JobId, SubmissionError> {
        let url = format!("{}/api/generate", self.base_url);

        let response = self.http.post(&url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SubmissionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|_| SubmissionError::MissingRequestId)?;

        parsed.request_id.ok_or(SubmissionError::MissingRequestId)
    }
}

/// Submit `request` and, on success only, record the returned job id in
/// `registry`. A failed submission leaves the registry untouched.
pub async fn submit_and_register<S: RegistryStore>(
    submitter: &Submitter,
    registry: &mut JobRegistry<S>,
    request: &ExperimentRequest,
) -> Result<JobId> {
    let id = submitter.submit(request).await?;
    info!(job_id = %id, "experiment submitted");
    registry
        .register(&id)
        .context("submission succeeded but the job id could not be persisted")?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MemoryStore;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn spawn_backend(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_submit_success_registers_job() {
        let router = Router::new().route(
            "/api/generate",
            post(|Json(body): Json<Value>| async move {
                // echo check: the payload arrives with camelCase keys
                assert!(body.get("newTraits").is_some());
                Json(json!({ "requestId": "abc" }))
            }),
        );
        let base = spawn_backend(router).await;

        let submitter = Submitter::new(base);
        let mut registry = JobRegistry::load(MemoryStore::new());
        let request = ExperimentRequest::default();

        let id = submit_and_register(&submitter, &mut registry, &request)
            .await
            .unwrap();
        assert_eq!(id, "abc");
        assert!(registry.contains("abc"));
    }

    #[tokio::test]
    async fn test_submit_non_success_status() {
        let router = Router::new().route(
            "/api/generate",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "backend exploded") }),
        );
        let base = spawn_backend(router).await;

        let submitter = Submitter::new(base);
        let mut registry = JobRegistry::load(MemoryStore::new());

        let err = submit_and_register(&submitter, &mut registry, &ExperimentRequest::default())
            .await
            .unwrap_err();
        let err = err.downcast::<SubmissionError>().unwrap();
        assert!(matches!(err, SubmissionError::Status { status: 500, .. }));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_submit_body_without_request_id() {
        let router = Router::new().route(
            "/api/generate",
            post(|| async { Json(json!({ "unexpected": true })) }),
        );
        let base = spawn_backend(router).await;

        let submitter = Submitter::new(base);
        let err = submitter.submit(&ExperimentRequest::default()).await.unwrap_err();
        assert!(matches!(err, SubmissionError::MissingRequestId));
    }

    #[tokio::test]
    async fn test_submit_unreachable_endpoint() {
        // nothing listens on this port
        let submitter = Submitter::new("http://127.0.0.1:1".to_string());
        let err = submitter.submit(&ExperimentRequest::default()).await.unwrap_err();
        assert!(matches!(err, SubmissionError::Transport(_)));
    }
}

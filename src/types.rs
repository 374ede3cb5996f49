//! Traitlab - Type Definitions
//!
//! Shared wire and domain types for the experiment submission client.
//! Field names are camelCase on the wire to match the backend protocol.

use serde::{Deserialize, Serialize};

// ─── Experiment Payload ──────────────────────────────────────────

/// A named string-valued attribute attached to an image or base image.
///
/// Names need not be unique within a list; order is insertion order and
/// is preserved through submission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trait {
    pub name: String,
    pub value: String,
}

impl Trait {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An optional starting image with its own trait set.
///
/// `image` is either empty or a base64 data URL produced from exactly
/// one user-selected file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseImage {
    pub image: String,
    pub traits: Vec<Trait>,
}

/// The full validated payload sent to the backend's generate endpoint.
///
/// All three fields are always present, defaulting to empty values even
/// if the user never touched them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentRequest {
    pub seed: String,
    pub new_traits: Vec<Trait>,
    pub base_image: BaseImage,
}

// ─── Backend Responses ───────────────────────────────────────────

/// Opaque backend-issued identifier for one submitted generation request.
pub type JobId = String;

/// Response body of the generate endpoint. A well-formed success carries
/// `requestId`; the submitter treats its absence as a failure.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub request_id: Option<JobId>,
}

/// One element of a completed result batch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResult {
    pub image: String,
    pub traits: Vec<Trait>,
    #[serde(default)]
    pub extra_data: String,
}

/// Response body of the query endpoint.
///
/// An absent `images` field means the job is still running; a present
/// field (even an empty array) means the batch is complete. This duality
/// is the only state the poller distinguishes.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct QueryResponse {
    pub images: Option<Vec<ImageResult>>,
}

// ─── Configuration ───────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraitlabConfig {
    /// Base URL of the generation backend, e.g. `http://localhost:8000`.
    pub backend_api: String,
    /// Base URL of the local proxy the client talks to.
    pub proxy_url: String,
    /// Address the proxy binds when serving.
    pub listen_addr: String,
    /// Path to the SQLite state database.
    pub db_path: String,
}

/// Returns the default `TraitlabConfig`. Callers may override any field
/// from the config file or environment.
pub fn default_config() -> TraitlabConfig {
    TraitlabConfig {
        backend_api: "http://localhost:8000".to_string(),
        proxy_url: "http://127.0.0.1:3000".to_string(),
        listen_addr: "127.0.0.1:3000".to_string(),
        db_path: "~/.traitlab/state.db".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experiment_request_serializes_camel_case() {
        let req = ExperimentRequest {
            seed: "42".to_string(),
            new_traits: vec![Trait::new("eyes", "green")],
            base_image: BaseImage::default(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["seed"], "42");
        assert_eq!(json["newTraits"][0]["name"], "eyes");
        assert!(json["baseImage"]["image"].as_str().unwrap().is_empty());
    }

    #[test]
    fn test_query_response_images_absent() {
        let resp: QueryResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.images.is_none());
    }

    #[test]
    fn test_query_response_images_empty_is_present() {
        let resp: QueryResponse = serde_json::from_str(r#"{"images": []}"#).unwrap();
        assert_eq!(resp.images.unwrap().len(), 0);
    }

    #[test]
    fn test_image_result_extra_data_defaults() {
        let resp: ImageResult =
            serde_json::from_str(r#"{"image": "x", "traits": []}"#).unwrap();
        assert!(resp.extra_data.is_empty());
    }
}

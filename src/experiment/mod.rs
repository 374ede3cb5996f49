//! Experiment Payload Codec
//!
//! Builds a validated `ExperimentRequest` from live user input: the form
//! state model, the file-to-data-URL encoder, and pre-submission
//! validation.

pub mod encode;
pub mod form;
pub mod validate;

pub use form::ExperimentForm;

//! Payload Validation
//!
//! Checks an `ExperimentRequest` before submission is allowed. Failures
//! are collected per field, keyed by the field's path within the payload,
//! so callers can surface them next to the offending input.
//!
//! Empty strings are permitted everywhere: an experiment may have no
//! seed, no traits, and no base image. The one structural invariant is
//! that `baseImage.image`, when set, must be a well-formed base64 data
//! URL produced from exactly one selected file.

use crate::error::{FieldError, ValidationError};
use crate::experiment::encode;
use crate::types::{ExperimentRequest, Trait};

/// Validate `request`, returning all field errors at once rather than
/// stopping at the first.
pub fn validate(request: &ExperimentRequest) -> Result<(), ValidationError> {
    let mut errors = Vec::new();

    check_traits(&request.new_traits, "newTraits", &mut errors);
    check_traits(&request.base_image.traits, "baseImage.traits", &mut errors);

    if !request.base_image.image.is_empty() && !encode::is_data_url(&request.base_image.image) {
        errors.push(FieldError::new(
            "baseImage.image",
            "must be empty or a base64 data URL",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError(errors))
    }
}

fn check_traits(traits: &[Trait], prefix: &str, errors: &mut Vec<FieldError>) {
    for (i, t) in traits.iter().enumerate() {
        // Interior NULs survive JSON serialization but not every storage
        // or display layer downstream; reject them at the boundary.
        if t.name.contains('\0') {
            errors.push(FieldError::new(
                format!("{}[{}].name", prefix, i),
                "must not contain NUL bytes",
            ));
        }
        if t.value.contains('\0') {
            errors.push(FieldError::new(
                format!("{}[{}].value", prefix, i),
                "must not contain NUL bytes",
            ));
        }
    }
}

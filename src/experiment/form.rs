//! Experiment Form State
//!
//! A single owned, normalized structure holding the in-progress
//! experiment: the seed, the new-trait list, and the base image with its
//! trait list. Trait lists are index-addressed ordered lists whose rows
//! carry stable identifiers (a monotonic counter, never reused) so a UI
//! layer can reconcile rows across edits.
//!
//! Every edit operation is a total replace of one field or index; the
//! form is the single source of truth for the payload.

use std::path::Path;

use anyhow::Result;

use crate::error::FieldError;
use crate::experiment::encode;
use crate::types::{BaseImage, ExperimentRequest, Trait};

/// One row of a trait list: a stable id plus the entry itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraitRow {
    pub id: u64,
    pub entry: Trait,
}

/// An ordered, index-addressed trait list with stable per-row ids.
#[derive(Clone, Debug, Default)]
pub struct TraitList {
    rows: Vec<TraitRow>,
    next_id: u64,
}

impl TraitList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an empty trait row, returning its stable id.
    pub fn append(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.rows.push(TraitRow {
            id,
            entry: Trait::default(),
        });
        id
    }

    /// Remove the row at `index`. Rows after it shift down; their ids are
    /// unchanged.
    pub fn remove(&mut self, index: usize) -> Result<(), FieldError> {
        if index >= self.rows.len() {
            return Err(self.out_of_range(index, ""));
        }
        self.rows.remove(index);
        Ok(())
    }

    /// Replace the name of the row at `index`.
    pub fn set_name(&mut self, index: usize, name: &str) -> Result<(), FieldError> {
        match self.rows.get_mut(index) {
            Some(row) => {
                row.entry.name = name.to_string();
                Ok(())
            }
            None => Err(self.out_of_range(index, ".name")),
        }
    }

    /// Replace the value of the row at `index`.
    pub fn set_value(&mut self, index: usize, value: &str) -> Result<(), FieldError> {
        match self.rows.get_mut(index) {
            Some(row) => {
                row.entry.value = value.to_string();
                Ok(())
            }
            None => Err(self.out_of_range(index, ".value")),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[TraitRow] {
        &self.rows
    }

    /// The entries in submission order, detached from their row ids.
    pub fn entries(&self) -> Vec<Trait> {
        self.rows.iter().map(|r| r.entry.clone()).collect()
    }

    fn out_of_range(&self, index: usize, suffix: &str) -> FieldError {
        FieldError::new(
            format!("[{}]{}", index, suffix),
            format!("index out of range (list has {} rows)", self.rows.len()),
        )
    }
}

/// The live form state for one experiment.
#[derive(Clone, Debug, Default)]
pub struct ExperimentForm {
    seed: String,
    pub new_traits: TraitList,
    base_image: String,
    pub base_traits: TraitList,
}

impl ExperimentForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the seed.
    pub fn set_seed(&mut self, seed: &str) {
        self.seed = seed.to_string();
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// The current base image data URL (empty if none set). Usable
    /// directly as an image source for thumbnail preview.
    pub fn base_image(&self) -> &str {
        &self.base_image
    }

    /// Replace the base image by encoding the file at `path`.
    ///
    /// When no file is selected (`None`), the operation is a no-op and
    /// the prior image value is retained. The encode must complete before
    /// the field is considered set.
    pub async fn attach_base_image(&mut self, path: Option<&Path>) -> Result<()> {
        let Some(path) = path else {
            return Ok(());
        };
        self.base_image = encode::encode_data_url(path).await?;
        Ok(())
    }

    /// Materialize the current payload. All three top-level fields are
    /// always present, defaulting to empty values.
    pub fn payload(&self) -> ExperimentRequest {
        ExperimentRequest {
            seed: self.seed.clone(),
            new_traits: self.new_traits.entries(),
            base_image: BaseImage {
                image: self.base_image.clone(),
                traits: self.base_traits.entries(),
            },
        }
    }

    /// Pretty-printed JSON dump of the in-progress payload. A read-only
    /// projection for preview, never a validation gate.
    pub fn preview(&self) -> String {
        serde_json::to_string_pretty(&self.payload()).unwrap_or_default()
    }
}

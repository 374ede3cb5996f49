//! Traitlab -- Experiment Submission Client
//!
//! Assembles image-generation experiments (a seed, named trait
//! overrides, and an optional base image), submits them to an external
//! backend through a same-origin proxy, and retrieves the generated
//! batch once processing completes.

pub mod config;
pub mod error;
pub mod experiment;
pub mod poll;
pub mod proxy;
pub mod registry;
pub mod state;
pub mod submit;
pub mod types;

//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs: attribute
//!   merging, relationship deduplication and the full import run.
//! - Keep the CLI layer decoupled from storage details.

pub mod companion_service;
pub mod import_service;
pub mod merge_service;

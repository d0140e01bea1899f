//! Canonical domain model for the reconciled plant knowledge base.
//!
//! # Responsibility
//! - Define the canonical plant identity and merged attribute shapes.
//! - Define the closed category vocabularies shared by all sources.
//!
//! # Invariants
//! - Every canonical plant is identified by one stable `PlantId`.
//! - Category values persist as their fixed SCREAMING_SNAKE_CASE tokens.

pub mod plant;

//! # Study Migrator Shared
//! This crate defines the data structures shared across the study migrator:
//! the documents read from the legacy document store, the records written to
//! the relational store, and the field validation applied in between.
#![recursion_limit = "256"]

pub mod types;
pub mod validation;

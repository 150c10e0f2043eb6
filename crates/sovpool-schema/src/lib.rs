//! # sovpool-schema — Boundary Contracts
//!
//! JSON Schema (Draft 2020-12) definitions for the documents that cross the
//! engine's boundary:
//!
//! - `signature-submission.schema.json`: the inbound submission payload.
//! - `pool-snapshot.schema.json`: the outbound pool snapshot.
//!
//! The schemas are embedded at compile time and compiled once by
//! [`SchemaValidator::new`]. Failures list every violation with its JSON
//! Pointer so HTTP clients get field-level diagnostics.

pub mod validate;

pub use validate::{Contract, SchemaValidationError, SchemaValidator, Violation};

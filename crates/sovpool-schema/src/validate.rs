//! # Boundary Schema Validation
//!
//! Validates JSON documents against the embedded Draft 2020-12 contracts
//! in `schemas/`. Every schema is compiled once when the
//! [`SchemaValidator`] is built; validation collects all violations rather
//! than stopping at the first, so a client sees every bad field at once.
//!
//! Schema validation is a boundary concern only. Once a payload passes,
//! the domain constructors in `sovpool-core` still parse each field into
//! its newtype; the schema never replaces that step.

use serde_json::Value;
use thiserror::Error;

const SUBMISSION_SCHEMA: &str = include_str!("../schemas/signature-submission.schema.json");
const SNAPSHOT_SCHEMA: &str = include_str!("../schemas/pool-snapshot.schema.json");

/// The contracts this crate knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Contract {
    /// Inbound signature submission.
    SignatureSubmission,
    /// Outbound pool snapshot.
    PoolSnapshot,
}

impl Contract {
    pub const ALL: [Contract; 2] = [Contract::SignatureSubmission, Contract::PoolSnapshot];

    /// The schema's `$id`.
    pub fn schema_id(&self) -> &'static str {
        match self {
            Self::SignatureSubmission => "https://schemas.sovpool.org/signature-submission.schema.json",
            Self::PoolSnapshot => "https://schemas.sovpool.org/pool-snapshot.schema.json",
        }
    }

    fn source(&self) -> &'static str {
        match self {
            Self::SignatureSubmission => SUBMISSION_SCHEMA,
            Self::PoolSnapshot => SNAPSHOT_SCHEMA,
        }
    }
}

/// One violation: where in the document, and what was wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer to the offending value (empty for the document root).
    pub instance_path: String,
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let path = if self.instance_path.is_empty() {
            "/"
        } else {
            self.instance_path.as_str()
        };
        write!(f, "{path}: {}", self.message)
    }
}

/// Errors from building the validator or validating a document.
#[derive(Error, Debug)]
pub enum SchemaValidationError {
    /// An embedded schema is not valid JSON.
    #[error("failed to load schema {schema_id}: {reason}")]
    SchemaLoad {
        schema_id: &'static str,
        reason: String,
    },

    /// An embedded schema is not a valid Draft 2020-12 schema.
    #[error("failed to compile schema {schema_id}: {reason}")]
    SchemaCompile {
        schema_id: &'static str,
        reason: String,
    },

    /// The document broke the contract.
    #[error("{count} validation error(s) against {schema_id}")]
    ValidationFailed {
        schema_id: &'static str,
        count: usize,
        violations: Vec<Violation>,
    },
}

impl SchemaValidationError {
    /// Violations carried by a `ValidationFailed`; empty otherwise.
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::ValidationFailed { violations, .. } => violations,
            _ => &[],
        }
    }
}

/// Compiled validators for every [`Contract`].
pub struct SchemaValidator {
    submission: jsonschema::Validator,
    snapshot: jsonschema::Validator,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("contracts", &Contract::ALL)
            .finish()
    }
}

impl SchemaValidator {
    /// Parse and compile every embedded schema.
    pub fn new() -> Result<Self, SchemaValidationError> {
        Ok(Self {
            submission: compile(Contract::SignatureSubmission)?,
            snapshot: compile(Contract::PoolSnapshot)?,
        })
    }

    /// The raw schema document for a contract, e.g. for publishing.
    pub fn schema_document(contract: Contract) -> Result<Value, SchemaValidationError> {
        serde_json::from_str(contract.source()).map_err(|e| SchemaValidationError::SchemaLoad {
            schema_id: contract.schema_id(),
            reason: e.to_string(),
        })
    }

    /// Validate `value` against `contract`, reporting every violation.
    pub fn validate(&self, contract: Contract, value: &Value) -> Result<(), SchemaValidationError> {
        let validator = match contract {
            Contract::SignatureSubmission => &self.submission,
            Contract::PoolSnapshot => &self.snapshot,
        };
        let violations: Vec<Violation> = validator
            .iter_errors(value)
            .map(|err| Violation {
                instance_path: err.instance_path.to_string(),
                message: err.to_string(),
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaValidationError::ValidationFailed {
                schema_id: contract.schema_id(),
                count: violations.len(),
                violations,
            })
        }
    }

    pub fn validate_submission(&self, value: &Value) -> Result<(), SchemaValidationError> {
        self.validate(Contract::SignatureSubmission, value)
    }

    pub fn validate_snapshot(&self, value: &Value) -> Result<(), SchemaValidationError> {
        self.validate(Contract::PoolSnapshot, value)
    }
}

fn compile(contract: Contract) -> Result<jsonschema::Validator, SchemaValidationError> {
    let schema = SchemaValidator::schema_document(contract)?;
    jsonschema::options()
        .with_draft(jsonschema::Draft::Draft202012)
        .build(&schema)
        .map_err(|e| SchemaValidationError::SchemaCompile {
            schema_id: contract.schema_id(),
            reason: e.to_string(),
        })
}

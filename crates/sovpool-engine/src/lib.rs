//! # sovpool-engine — Signature Pooling and Merkle Anchoring
//!
//! Admits individually signed support expressions, weights them by identity
//! assurance, batches them per region/cycle, and seals each batch into a
//! Merkle root anchored on an external ledger.
//!
//! ## Components
//!
//! - [`MeritWeightCalculator`]: assurance tier to weight.
//! - [`DuplicateGuard`]: one signature per voter and content per pool, no
//!   replayed evidence.
//! - [`SignatureIngestionGate`]: boundary validation and the admission
//!   decision, without side effects.
//! - [`RegionalPoolRegistry`]: the single writer of pool state; drives
//!   `OPEN → SEALING → ANCHORED | CORRUPTED`.
//! - [`MerkleSealer`]: canonical root over a pool's ordered leaves.
//! - [`AnchorPublisher`]: the ledger seam; [`LocalLedger`] is the
//!   in-process implementation.
//!
//! Collaborators are injected: the publisher and the [`AlertSink`] are
//! passed to [`RegionalPoolRegistry::new`], never reached through globals.

pub mod alert;
pub mod anchor;
pub mod config;
pub mod error;
pub mod guard;
pub mod ingest;
pub mod registry;
pub mod retry;
pub mod sealer;
pub mod weight;

pub use alert::{Alert, AlertSink, CollectingAlertSink, TracingAlertSink};
pub use anchor::{AnchorConfirmation, AnchorError, AnchorPublisher, AnchorRequest, LocalLedger};
pub use config::{ConfigError, PoolingConfig};
pub use error::PoolingError;
pub use guard::DuplicateGuard;
pub use ingest::{Admission, SignatureIngestionGate, SignatureSubmission, ValidatedSubmission};
pub use registry::{AdmissionReceipt, AuditReport, RegionalPoolRegistry};
pub use retry::RetryPolicy;
pub use sealer::MerkleSealer;
pub use weight::MeritWeightCalculator;

//! # sovpool-cli — Offline Pool Verification
//!
//! Lets an auditor check a published anchor without trusting the service:
//! recompute a pool's root from its leaf list, produce or check an
//! inclusion proof, and derive an evidence hash the same way a client does.
//!
//! ## Subcommands
//!
//! - `root` — Merkle root and leaf count over a leaf file
//! - `prove` — inclusion proof for one leaf, as JSON
//! - `verify` — check a proof; the exit code carries the verdict
//! - `evidence` — evidence hash for a voter, content and nonce
//!
//! Handlers return the process exit code. Domain logic lives in
//! `sovpool-core` and `sovpool-crypto`.

pub mod evidence;
pub mod merkle;

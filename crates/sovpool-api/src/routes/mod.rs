//! # API Route Modules
//!
//! - `signatures`: citizen-facing submission endpoint.
//! - `pools`: pool snapshots, sealing, anchoring retries, audits and
//!   inclusion proofs.

pub mod pools;
pub mod signatures;

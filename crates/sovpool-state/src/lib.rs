//! # sovpool-state — Regional Pool Lifecycle
//!
//! A regional pool moves through four states:
//!
//! ```text
//! OPEN ──seal──▶ SEALING ──ledger confirms──▶ ANCHORED
//!                   │
//!                   └──root mismatch──▶ CORRUPTED
//! ```
//!
//! Transitions are checked at runtime against [`PoolStatus::can_transition_to`]
//! and appended to a per-pool transition log. There is no edge back to
//! `OPEN`; `ANCHORED` and `CORRUPTED` are terminal.
//!
//! The pool owns its ordered member list and weight accumulator. It does
//! no locking of its own; the registry in `sovpool-engine` serializes
//! every mutation of a pool behind one mutex.

pub mod pool;

pub use pool::{
    AcceptedSignature, PoolRecord, PoolSnapshot, PoolStateError, PoolStatus,
    PoolTransitionRecord, RegionalPool,
};

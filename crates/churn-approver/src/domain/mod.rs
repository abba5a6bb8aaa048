//! Domain layer: pure protocol logic with no I/O.
//!
//! - `entities` — request/reply types and ledger snapshots
//! - `errors` — the caller-visible error taxonomy
//! - `attestation` — request hashing and BLS verification
//! - `admission` — the economic churn decision math
//! - `approval` — salt, expiry, and recoverable approval signing

pub mod admission;
pub mod approval;
pub mod attestation;
pub mod entities;
pub mod errors;

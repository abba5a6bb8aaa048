//! # Churn Approver
//!
//! Admission gatekeeper for capacity-capped operator quorums. When a quorum
//! is full, a candidate operator may still register by churning out the
//! lowest-stake incumbent — provided the candidate authenticates itself and
//! clears the quorum's economic thresholds. This crate validates those
//! requests and issues short-lived, signed approvals the on-chain registry
//! verifies.
//!
//! ## Architecture
//!
//! Hexagonal: a pure domain core behind an inbound API port, with outbound
//! capability traits for the on-chain state it reads.
//!
//! - [`domain::attestation`] — request hashing, BLS key-equivalence proof,
//!   request signature verification
//! - [`domain::admission`] — the stake-threshold churn decision
//! - [`domain::approval`] — salt derivation, expiry, ECDSA approval signing
//! - [`service`] — the request pipeline and shared server state (global
//!   approval window, per-operator rate limits, quorum-count cache)
//! - [`ports`] — `ChurnApi` inbound, `StakeLedger`/`OperatorDirectory`
//!   outbound
//!
//! ## Guarantees
//!
//! - At most one valid, unexpired approval exists at any instant; a second
//!   request inside the window is rejected with the remaining wait.
//! - An operator's rate-limit slot is consumed by every request, successful
//!   or not.
//! - An approval is only ever signed for a candidate that proved possession
//!   of a registered BLS key in both pairing groups.

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use config::{ChurnConfig, ConfigError};
pub use domain::approval::{ApprovalSigner, SignerKeyError, APPROVAL_TTL};
pub use domain::entities::{
    Address, BlsSignature, ChurnDecision, ChurnReply, ChurnRequest, OperatorId, OperatorIdentity,
    OperatorStakeEntry, QuorumAdmissionParams, QuorumId, SignedApproval,
};
pub use domain::errors::ChurnError;
pub use ports::inbound::ChurnApi;
pub use ports::outbound::{DirectoryError, LedgerError, OperatorDirectory, StakeLedger};
pub use service::ChurnService;

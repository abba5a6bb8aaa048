//! # Outbound Ports (Driven Ports / SPI)
//!
//! Capability traits for the on-chain collaborators the service consumes.
//! Production adapters wrap contract bindings and the indexer; tests inject
//! deterministic doubles. All reads are per-request snapshots; nothing here
//! is cached by the service beyond the lazy quorum count.

use crate::domain::entities::{
    Address, ChurnDecision, OperatorId, OperatorStakeEntry, QuorumAdmissionParams, QuorumId,
};
use crate::domain::errors::ChurnError;
use primitive_types::U256;
use thiserror::Error;

/// Error from stake ledger reads.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A contract call reverted or returned malformed data
    #[error("ledger query failed: {0}")]
    Query(String),

    /// The node or RPC endpoint was unreachable
    #[error("ledger connection error: {0}")]
    Connection(String),
}

/// Error from operator directory lookups.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// No indexed record for the operator at the requested block
    #[error("operator {0} not indexed")]
    NotIndexed(String),

    /// The indexer backend failed
    #[error("directory query failed: {0}")]
    Query(String),
}

impl From<LedgerError> for ChurnError {
    fn from(err: LedgerError) -> Self {
        ChurnError::LedgerRead(err.to_string())
    }
}

impl From<DirectoryError> for ChurnError {
    fn from(err: DirectoryError) -> Self {
        ChurnError::DirectoryRead(err.to_string())
    }
}

/// Read-only view of on-chain registration and stake state, plus the
/// canonical digest the on-chain verifier expects the approval to sign.
///
/// Implementations must be thread-safe; the service issues these calls
/// concurrently across requests with no caller-imposed timeout — deadlines
/// belong to the transport layer wrapping the `churn` call.
#[async_trait::async_trait]
pub trait StakeLedger: Send + Sync {
    /// Resolve an operator ID to its registered address. Returns the zero
    /// address for keys that were never registered.
    async fn resolve_address(&self, operator_id: &OperatorId) -> Result<Address, LedgerError>;

    /// The quorums an operator is currently a member of.
    async fn quorum_membership(
        &self,
        operator_id: &OperatorId,
    ) -> Result<Vec<QuorumId>, LedgerError>;

    /// Current chain head block number.
    async fn current_block_number(&self) -> Result<u32, LedgerError>;

    /// Total number of quorums at a block.
    async fn quorum_count(&self, block_number: u32) -> Result<u8, LedgerError>;

    /// Stake list per requested quorum at a block, parallel to `quorum_ids`.
    /// An empty list means the quorum has no incumbents.
    async fn operator_stakes(
        &self,
        quorum_ids: &[QuorumId],
        block_number: u32,
    ) -> Result<Vec<Vec<OperatorStakeEntry>>, LedgerError>;

    /// Admission policy for one quorum.
    async fn admission_params(
        &self,
        quorum_id: QuorumId,
    ) -> Result<QuorumAdmissionParams, LedgerError>;

    /// The candidate's stake weight in one quorum.
    async fn stake_weight(
        &self,
        quorum_id: QuorumId,
        operator_address: &Address,
    ) -> Result<U256, LedgerError>;

    /// Canonical digest of a churn approval. Delegated to the ledger client
    /// because the encoding must match the on-chain verifier exactly.
    async fn approval_digest(
        &self,
        operator_id: &OperatorId,
        decisions: &[ChurnDecision],
        salt: &[u8; 32],
        expiry: u64,
    ) -> Result<[u8; 32], LedgerError>;
}

/// Resolves an operator ID to its indexed public-key record as of a block.
#[async_trait::async_trait]
pub trait OperatorDirectory: Send + Sync {
    /// The operator's indexed G1 public key.
    async fn indexed_pubkey_g1(
        &self,
        operator_id: &OperatorId,
        block_number: u32,
    ) -> Result<[u8; 48], DirectoryError>;
}

//! # Domain Entities
//!
//! Core data structures of the churn approval protocol: the candidate's
//! identity, the churn request/reply pair, per-quorum admission policy and
//! stake snapshots, and the signed approval the candidate submits on-chain.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

/// Quorum identifier. The on-chain registry supports at most 256 quorums.
pub type QuorumId = u8;

/// Operator identifier: keccak256 of the operator's G1 public key.
pub type OperatorId = [u8; 32];

/// Ethereum-style 20-byte account address.
pub type Address = [u8; 20];

/// 32-byte keccak256 digest.
pub type Hash = [u8; 32];

/// The zero address. A key resolving to it has never been registered.
pub const ZERO_ADDRESS: Address = [0u8; 20];

// =============================================================================
// Candidate Identity
// =============================================================================

/// A candidate operator's BLS identity.
///
/// The same secret key is presented in both pairing groups: the G1 encoding
/// is the on-chain registration key (its keccak256 hash is the operator ID),
/// the G2 encoding is what request signatures verify against. Group
/// equivalence of the two encodings is proven cryptographically during
/// request verification, never assumed.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorIdentity {
    /// G1 public key (48 bytes compressed)
    #[serde_as(as = "Bytes")]
    pub pubkey_g1: [u8; 48],
    /// G2 public key (96 bytes compressed)
    #[serde_as(as = "Bytes")]
    pub pubkey_g2: [u8; 96],
}

impl OperatorIdentity {
    /// The operator ID is derived from the G1 key and is never chosen
    /// independently; it must match the on-chain registration.
    pub fn operator_id(&self) -> OperatorId {
        super::attestation::keccak256(&self.pubkey_g1)
    }
}

/// BLS signature over the churn request hash (G1 point, 48 bytes compressed).
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlsSignature {
    #[serde_as(as = "Bytes")]
    pub bytes: [u8; 48],
}

// =============================================================================
// Request / Reply
// =============================================================================

/// An inbound churn request. Consumed exactly once; never persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChurnRequest {
    /// The candidate operator asking to register
    pub identity: OperatorIdentity,
    /// Candidate's signature over its own request hash
    pub signature: BlsSignature,
    /// Caller-chosen nonce bound into the request hash
    pub salt: [u8; 32],
    /// Quorums the candidate wants to join
    pub quorum_ids: Vec<QuorumId>,
}

/// One incumbent the candidate is approved to force out of a full quorum.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChurnDecision {
    /// Quorum the incumbent is churned out of
    pub quorum_id: QuorumId,
    /// Incumbent's on-chain address
    pub operator_address: Address,
    /// Incumbent's indexed G1 public key
    #[serde_as(as = "Bytes")]
    pub operator_pubkey_g1: [u8; 48],
}

/// A recoverable signature over the approval digest, bound to a salt and an
/// absolute expiry so it can neither be replayed nor hoarded.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedApproval {
    /// 65-byte recoverable signature (r || s || v), v in {27, 28}
    #[serde_as(as = "Bytes")]
    pub signature: [u8; 65],
    /// Signer-derived nonce bound into the digest
    pub salt: [u8; 32],
    /// Unix timestamp after which the approval is worthless on-chain
    pub expiry: u64,
}

/// Successful churn response: the approval plus zero or more decisions
/// (at most one per requested quorum).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChurnReply {
    pub approval: SignedApproval,
    pub operators_to_churn: Vec<ChurnDecision>,
}

// =============================================================================
// Ledger Snapshots
// =============================================================================

/// Per-quorum admission policy read from the ledger. The `bips` fields are
/// basis points (1/10000); policy knobs, never mutated here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumAdmissionParams {
    pub max_operator_count: u32,
    pub churn_bips_of_operator_stake: u32,
    pub churn_bips_of_total_stake: u32,
}

/// One incumbent's stake in a quorum, as of a given block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorStakeEntry {
    pub operator_id: OperatorId,
    pub stake: U256,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(seed: u8) -> OperatorIdentity {
        OperatorIdentity {
            pubkey_g1: [seed; 48],
            pubkey_g2: [seed; 96],
        }
    }

    #[test]
    fn operator_id_is_deterministic() {
        let a = identity(7);
        assert_eq!(a.operator_id(), a.operator_id());
    }

    #[test]
    fn operator_id_depends_on_g1_key_only() {
        let mut a = identity(7);
        let id = a.operator_id();

        // G2 key does not influence the ID
        a.pubkey_g2 = [9; 96];
        assert_eq!(a.operator_id(), id);

        // G1 key does
        a.pubkey_g1 = [8; 48];
        assert_ne!(a.operator_id(), id);
    }

    #[test]
    fn signed_approval_round_trips_through_serde() {
        let approval = SignedApproval {
            signature: [3u8; 65],
            salt: [4u8; 32],
            expiry: 1_700_000_090,
        };

        let encoded = serde_json::to_string(&approval).unwrap();
        let decoded: SignedApproval = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded, approval);
    }
}

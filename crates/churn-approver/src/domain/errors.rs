//! # Churn Errors
//!
//! Error taxonomy for the churn approval protocol. Every failure a caller
//! can see is one of these kinds; `is_transient` tells the caller whether a
//! retry can ever help without its request changing.

use super::entities::QuorumId;
use primitive_types::U256;
use thiserror::Error;

/// Errors returned by the churn approval service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChurnError {
    /// The candidate's G1 key resolves to the zero address on the ledger
    #[error("candidate public key is not registered on the ledger")]
    UnregisteredPubkey,

    /// The G1 and G2 key encodings do not share an underlying secret key
    #[error("candidate G1 and G2 public keys are not equivalent")]
    KeyMismatch,

    /// The request signature does not verify against the candidate's G2 key
    #[error("churn request signature is invalid")]
    InvalidSignature,

    /// The candidate is already a member of a requested quorum
    #[error("operator is already registered in quorum {0}")]
    AlreadyRegistered(QuorumId),

    /// A requested quorum ID is beyond the ledger's current quorum count
    #[error("quorum ID {requested} is out of range; ledger reports {count} quorums")]
    InvalidQuorumId { requested: QuorumId, count: u8 },

    /// A quorum's admission params report a zero operator capacity
    #[error("quorum {0} has a zero max operator count")]
    MisconfiguredQuorum(QuorumId),

    /// Another approval is still live; at most one exists system-wide
    #[error("previous approval has not expired; retry in {retry_in_secs}s")]
    PreviousApprovalNotExpired { retry_in_secs: u64 },

    /// The per-operator cooldown has not elapsed
    #[error("rate limit exceeded for operator; retry in {retry_in_secs}s")]
    RateLimitExceeded { retry_in_secs: u64 },

    /// Candidate does not out-stake the weakest incumbent by the configured
    /// margin
    #[error(
        "candidate stake {candidate_stake} does not exceed the churn margin over the \
         lowest-stake incumbent ({lowest_stake}) in quorum {quorum_id}"
    )]
    InsufficientRelativeStake {
        quorum_id: QuorumId,
        candidate_stake: U256,
        lowest_stake: U256,
    },

    /// The weakest incumbent holds too large a share of total quorum stake
    /// to ever be forced out
    #[error(
        "lowest-stake incumbent ({lowest_stake}) holds at least the churn floor share of \
         total stake ({total_stake}) in quorum {quorum_id}"
    )]
    IncumbentAboveChurnFloor {
        quorum_id: QuorumId,
        lowest_stake: U256,
        total_stake: U256,
    },

    /// A ledger read failed; no admission state was observed
    #[error("ledger read failed: {0}")]
    LedgerRead(String),

    /// The operator directory could not resolve an indexed record
    #[error("operator directory read failed: {0}")]
    DirectoryRead(String),

    /// The ledger could not compute the canonical approval digest
    #[error("approval digest computation failed: {0}")]
    DigestComputationFailed(String),

    /// The signing backend failed; no partial signature is ever returned
    #[error("approval signing failed")]
    SigningFailed,
}

impl ChurnError {
    /// Whether the caller may retry the identical request later.
    ///
    /// Permanent kinds require the caller to change something (its keys, its
    /// stake, its quorum set) before a retry can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ChurnError::PreviousApprovalNotExpired { .. }
                | ChurnError::RateLimitExceeded { .. }
                | ChurnError::LedgerRead(_)
                | ChurnError::DirectoryRead(_)
                | ChurnError::DigestComputationFailed(_)
                | ChurnError::SigningFailed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_kinds_are_retryable() {
        assert!(ChurnError::PreviousApprovalNotExpired { retry_in_secs: 42 }.is_transient());
        assert!(ChurnError::RateLimitExceeded { retry_in_secs: 1 }.is_transient());
        assert!(ChurnError::LedgerRead("rpc timeout".into()).is_transient());
        assert!(ChurnError::SigningFailed.is_transient());
    }

    #[test]
    fn permanent_kinds_are_not_retryable() {
        assert!(!ChurnError::UnregisteredPubkey.is_transient());
        assert!(!ChurnError::KeyMismatch.is_transient());
        assert!(!ChurnError::InvalidSignature.is_transient());
        assert!(!ChurnError::AlreadyRegistered(0).is_transient());
        assert!(!ChurnError::InvalidQuorumId {
            requested: 5,
            count: 3
        }
        .is_transient());
        assert!(!ChurnError::InsufficientRelativeStake {
            quorum_id: 0,
            candidate_stake: U256::from(1),
            lowest_stake: U256::from(2),
        }
        .is_transient());
    }

    #[test]
    fn window_error_reports_remaining_seconds() {
        let err = ChurnError::PreviousApprovalNotExpired { retry_in_secs: 89 };
        assert!(err.to_string().contains("89"));
    }
}

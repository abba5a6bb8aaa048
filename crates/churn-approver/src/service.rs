//! # Churn Approval Service
//!
//! The concurrency- and state-owning front door. One `churn` call walks the
//! request through quorum-range validation, the global approval window,
//! candidate authentication, per-operator rate limiting, the admission
//! decision, and approval signing.
//!
//! Two pieces of state are shared across concurrent calls: the global
//! approval window and the per-operator rate table. Both live behind one
//! mutex so every check-then-write sequence is atomic; the lock is never
//! held across an `.await`. Because the window is checked again when the
//! approval is committed, at most one valid, unexpired approval exists
//! system-wide at any instant — a concurrently signed loser is discarded,
//! never returned.

use crate::config::{ChurnConfig, ConfigError};
use crate::domain::admission;
use crate::domain::approval::ApprovalSigner;
use crate::domain::attestation;
use crate::domain::entities::{
    Address, ChurnDecision, ChurnReply, ChurnRequest, OperatorId, QuorumId, SignedApproval,
    ZERO_ADDRESS,
};
use crate::domain::errors::ChurnError;
use crate::ports::inbound::ChurnApi;
use crate::ports::outbound::{OperatorDirectory, StakeLedger};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Churn approval service over an injected ledger and operator directory.
pub struct ChurnService<L, D> {
    ledger: L,
    directory: D,
    signer: ApprovalSigner,
    cooldown: Duration,
    state: Mutex<ServiceState>,
}

/// Server-owned mutable state. Exclusively owned by the service; read and
/// written only under the service mutex.
struct ServiceState {
    /// Expiry of the most recently issued approval (unix seconds, init 0).
    latest_expiry: u64,
    /// Last request instant per operator. Bounded: entries older than the
    /// cooldown are pruned on access, they can never reject anything again.
    last_request: HashMap<OperatorId, Instant>,
    /// Lazily refreshed ledger quorum count.
    quorum_count: u8,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl<L, D> ChurnService<L, D>
where
    L: StakeLedger,
    D: OperatorDirectory,
{
    /// Build the service from validated configuration and injected ports.
    pub fn new(config: &ChurnConfig, ledger: L, directory: D) -> Result<Self, ConfigError> {
        config.validate()?;
        let signer = ApprovalSigner::from_hex(&config.signer_private_key_hex)?;

        info!(
            signer_address = %hex::encode(signer.address()),
            cooldown_secs = config.per_operator_cooldown.as_secs(),
            "churn service created"
        );

        Ok(Self {
            ledger,
            directory,
            signer,
            cooldown: config.per_operator_cooldown,
            state: Mutex::new(ServiceState {
                latest_expiry: 0,
                last_request: HashMap::new(),
                quorum_count: 0,
            }),
        })
    }

    /// Validate every requested quorum ID against the ledger's quorum count,
    /// refreshing the cached count at most once per request. A stale cache
    /// costs one extra ledger round trip, never an incorrect admission.
    async fn ensure_quorums_in_range(&self, quorum_ids: &[QuorumId]) -> Result<(), ChurnError> {
        let cached = self.state.lock().quorum_count;
        let mut count = cached;

        if quorum_ids.iter().any(|&id| id >= cached) {
            let block_number = self.ledger.current_block_number().await?;
            count = self.ledger.quorum_count(block_number).await?;
            debug!(cached, refreshed = count, block_number, "refreshed quorum count");
            self.state.lock().quorum_count = count;
        }

        for &id in quorum_ids {
            if id >= count {
                return Err(ChurnError::InvalidQuorumId {
                    requested: id,
                    count,
                });
            }
        }
        Ok(())
    }

    /// Fast-path rejection while an earlier approval is still live.
    fn check_approval_window(&self) -> Result<(), ChurnError> {
        let latest_expiry = self.state.lock().latest_expiry;
        let now = unix_now();
        if now < latest_expiry {
            return Err(ChurnError::PreviousApprovalNotExpired {
                retry_in_secs: latest_expiry - now,
            });
        }
        Ok(())
    }

    /// Check the per-operator cooldown and mark this request immediately.
    ///
    /// Write-then-proceed: the slot is consumed even when a later stage
    /// fails, so a failing operator cannot hammer the decision pipeline.
    fn check_and_mark_rate_limit(&self, operator_id: &OperatorId) -> Result<(), ChurnError> {
        let mut state = self.state.lock();

        // Expired entries can never reject again; dropping them here keeps
        // the table bounded by the number of operators seen per cooldown.
        let cooldown = self.cooldown;
        state.last_request.retain(|_, last| last.elapsed() < cooldown);

        if let Some(last) = state.last_request.get(operator_id) {
            let remaining = cooldown.saturating_sub(last.elapsed());
            return Err(ChurnError::RateLimitExceeded {
                retry_in_secs: remaining.as_secs().max(1),
            });
        }

        state.last_request.insert(*operator_id, Instant::now());
        Ok(())
    }

    /// Authenticate the candidate: registered key, group equivalence, and a
    /// valid signature over its own request hash.
    async fn verify_request_signature(
        &self,
        request: &ChurnRequest,
    ) -> Result<Address, ChurnError> {
        let operator_id = request.identity.operator_id();

        let address = self.ledger.resolve_address(&operator_id).await?;
        if address == ZERO_ADDRESS {
            warn!(
                operator_id = %hex::encode(operator_id),
                "candidate key is not registered on the ledger"
            );
            return Err(ChurnError::UnregisteredPubkey);
        }

        if !attestation::keys_equivalent(
            &request.identity.pubkey_g1,
            &request.identity.pubkey_g2,
        ) {
            return Err(ChurnError::KeyMismatch);
        }

        let message_hash = attestation::request_hash(
            &request.identity.pubkey_g1,
            &request.identity.pubkey_g2,
            &request.salt,
        );
        if !attestation::verify_request_signature(
            &message_hash,
            &request.signature.bytes,
            &request.identity.pubkey_g2,
        ) {
            return Err(ChurnError::InvalidSignature);
        }

        Ok(address)
    }

    /// Reject candidates already registered in any requested quorum.
    async fn ensure_not_member(
        &self,
        operator_id: &OperatorId,
        quorum_ids: &[QuorumId],
    ) -> Result<(), ChurnError> {
        let membership = self.ledger.quorum_membership(operator_id).await?;
        for &id in quorum_ids {
            if membership.contains(&id) {
                return Err(ChurnError::AlreadyRegistered(id));
            }
        }
        Ok(())
    }

    /// Per quorum, decide whether the candidate may churn out the weakest
    /// incumbent, resolving the incumbent's address and indexed key when it
    /// may. A quorum below capacity contributes no decision; the first
    /// quorum failing an economic check fails the whole request.
    async fn operators_to_churn(
        &self,
        candidate_address: &Address,
        quorum_ids: &[QuorumId],
    ) -> Result<Vec<ChurnDecision>, ChurnError> {
        let block_number = self.ledger.current_block_number().await?;
        let stakes_per_quorum = self.ledger.operator_stakes(quorum_ids, block_number).await?;
        if stakes_per_quorum.len() != quorum_ids.len() {
            return Err(ChurnError::LedgerRead(format!(
                "requested stakes for {} quorums, ledger returned {}",
                quorum_ids.len(),
                stakes_per_quorum.len()
            )));
        }

        let mut decisions = Vec::new();

        for (&quorum_id, stakes) in quorum_ids.iter().zip(&stakes_per_quorum) {
            let params = self.ledger.admission_params(quorum_id).await?;

            if !admission::quorum_is_full(quorum_id, &params, stakes)? {
                info!(
                    quorum_id,
                    operators = stakes.len(),
                    max_operator_count = params.max_operator_count,
                    "quorum is not full; candidate can register without churn"
                );
                continue;
            }

            let candidate_stake = self.ledger.stake_weight(quorum_id, candidate_address).await?;

            let incumbent =
                admission::select_incumbent(quorum_id, &params, stakes, candidate_stake)
                    .map_err(|err| {
                        warn!(quorum_id, %err, "churn denied");
                        err
                    })?;

            info!(
                quorum_id,
                lowest_stake = %incumbent.stake,
                candidate_stake = %candidate_stake,
                total_stake = %incumbent.total_stake,
                block_number,
                "selected lowest-stake incumbent for churn"
            );

            let incumbent_address = self.ledger.resolve_address(&incumbent.operator_id).await?;
            let incumbent_pubkey_g1 = self
                .directory
                .indexed_pubkey_g1(&incumbent.operator_id, block_number)
                .await?;

            info!(
                quorum_id,
                churned_out = %hex::encode(incumbent_address),
                churned_in = %hex::encode(candidate_address),
                block_number,
                "churn decision made"
            );

            decisions.push(ChurnDecision {
                quorum_id,
                operator_address: incumbent_address,
                operator_pubkey_g1: incumbent_pubkey_g1,
            });
        }

        Ok(decisions)
    }

    /// Derive the salt and expiry, fetch the canonical digest from the
    /// ledger, and sign it.
    async fn sign_approval(
        &self,
        candidate_id: &OperatorId,
        decisions: &[ChurnDecision],
    ) -> Result<SignedApproval, ChurnError> {
        let now = SystemTime::now();
        let salt = self.signer.derive_salt(candidate_id, now);
        let expiry = ApprovalSigner::expiry_at(now);

        let digest = self
            .ledger
            .approval_digest(candidate_id, decisions, &salt, expiry)
            .await
            .map_err(|err| ChurnError::DigestComputationFailed(err.to_string()))?;

        let signature = self.signer.sign_digest(&digest)?;

        Ok(SignedApproval {
            signature,
            salt,
            expiry,
        })
    }

    /// Publish the approval window atomically. Re-checks the window under
    /// the same lock as the earlier fast-path check: when two requests race
    /// past it, exactly one commits here and the loser's signature is
    /// dropped without ever reaching a caller.
    fn commit_approval(&self, expiry: u64) -> Result<(), ChurnError> {
        let mut state = self.state.lock();
        let now = unix_now();
        if now < state.latest_expiry {
            return Err(ChurnError::PreviousApprovalNotExpired {
                retry_in_secs: state.latest_expiry - now,
            });
        }
        state.latest_expiry = expiry;
        Ok(())
    }
}

#[async_trait::async_trait]
impl<L, D> ChurnApi for ChurnService<L, D>
where
    L: StakeLedger,
    D: OperatorDirectory,
{
    async fn churn(&self, request: ChurnRequest) -> Result<ChurnReply, ChurnError> {
        let operator_id = request.identity.operator_id();
        info!(
            operator_id = %hex::encode(operator_id),
            quorum_ids = ?request.quorum_ids,
            "received churn request"
        );

        self.ensure_quorums_in_range(&request.quorum_ids).await?;
        self.check_approval_window()?;

        let candidate_address = self.verify_request_signature(&request).await?;

        // The cooldown slot is consumed before any decision work, and is
        // deliberately not rolled back when a later stage fails.
        self.check_and_mark_rate_limit(&operator_id)?;

        self.ensure_not_member(&operator_id, &request.quorum_ids)
            .await?;

        let decisions = self
            .operators_to_churn(&candidate_address, &request.quorum_ids)
            .await?;

        let approval = self.sign_approval(&operator_id, &decisions).await?;
        self.commit_approval(approval.expiry)?;

        info!(
            operator_id = %hex::encode(operator_id),
            decisions = decisions.len(),
            expiry = approval.expiry,
            "issued churn approval"
        );

        Ok(ChurnReply {
            approval,
            operators_to_churn: decisions,
        })
    }
}

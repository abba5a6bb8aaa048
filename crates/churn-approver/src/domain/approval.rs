//! # Approval Signing
//!
//! Once a churn decision stands, the service issues a recoverable secp256k1
//! signature over the ledger's canonical approval digest, bound to a
//! keyed-nonce salt and a fixed 90-second validity window. The on-chain
//! verifier recovers the signer address from the `{27, 28}` recovery byte.

use super::attestation::keccak256;
use super::entities::{Address, Hash, OperatorId};
use super::errors::ChurnError;
use k256::ecdsa::SigningKey;
use sha3::{Digest, Keccak256};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// How long an issued approval stays valid. Fixed, not configurable: the
/// on-chain registration must land inside this window.
pub const APPROVAL_TTL: Duration = Duration::from_secs(90);

/// Domain separator for salt derivation.
const SALT_DOMAIN: &[u8] = b"churn";

/// Failure to construct a signer from configured key material.
#[derive(Debug, Error)]
pub enum SignerKeyError {
    #[error("signer private key is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("signer private key is not a valid secp256k1 scalar")]
    InvalidScalar,
}

/// Holds the approval signing key and produces salts and signatures.
pub struct ApprovalSigner {
    signing_key: SigningKey,
}

impl ApprovalSigner {
    /// Build a signer from a hex-encoded secp256k1 private key
    /// (with or without a `0x` prefix).
    pub fn from_hex(key_hex: &str) -> Result<Self, SignerKeyError> {
        let stripped = key_hex.trim().trim_start_matches("0x");
        let bytes = hex::decode(stripped)?;
        let signing_key =
            SigningKey::from_slice(&bytes).map_err(|_| SignerKeyError::InvalidScalar)?;
        Ok(Self { signing_key })
    }

    /// Derive the approval salt for one candidate at one instant.
    ///
    /// The signer's secret key material is folded into the hash so the salt
    /// is bound to this signer and unpredictable to third parties — a keyed
    /// nonce, not a security-critical secret in itself.
    pub fn derive_salt(&self, candidate_id: &OperatorId, now: SystemTime) -> [u8; 32] {
        let now_nanos = now
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();

        let mut hasher = Keccak256::new();
        hasher.update(SALT_DOMAIN);
        hasher.update(now_nanos.to_string().as_bytes());
        hasher.update(candidate_id);
        hasher.update(self.signing_key.to_bytes());

        let mut salt = [0u8; 32];
        salt.copy_from_slice(&hasher.finalize());
        salt
    }

    /// The absolute expiry for an approval issued at `now`.
    pub fn expiry_at(now: SystemTime) -> u64 {
        let issued = now.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
        issued + APPROVAL_TTL.as_secs()
    }

    /// Sign the approval digest, producing a 65-byte recoverable signature
    /// `r || s || v` with the recovery byte normalized to `{27, 28}`.
    pub fn sign_digest(&self, digest: &Hash) -> Result<[u8; 65], ChurnError> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(digest)
            .map_err(|_| ChurnError::SigningFailed)?;

        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&signature.to_bytes());

        let mut v = recovery_id.to_byte();
        if v != 27 && v != 28 {
            v += 27;
        }
        out[64] = v;

        Ok(out)
    }

    /// The signer's own Ethereum-style address, for logs and tests.
    pub fn address(&self) -> Address {
        let encoded = self.signing_key.verifying_key().to_encoded_point(false);
        let hash = keccak256(&encoded.as_bytes()[1..]);

        let mut address = [0u8; 20];
        address.copy_from_slice(&hash[12..]);
        address
    }
}

impl std::fmt::Debug for ApprovalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never render key material
        f.debug_struct("ApprovalSigner")
            .field("address", &hex::encode(self.address()))
            .finish()
    }
}

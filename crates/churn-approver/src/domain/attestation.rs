//! # Request Attestation (BLS12-381)
//!
//! Pure verification logic for inbound churn requests: the request hash the
//! candidate signs, the pairing-based proof that the candidate's G1 and G2
//! key encodings share one secret key, and the signature check itself.
//!
//! Conventions:
//! - Candidate registration keys are on G1 (48 bytes compressed)
//! - Verification keys are on G2 (96 bytes compressed)
//! - Request signatures are on G1 (blst `min_sig` variant)

use super::entities::Hash;
use blst::min_sig::{PublicKey, Signature};
use blst::{
    blst_final_exp, blst_fp12, blst_fp12_is_one, blst_fp12_mul, blst_miller_loop, blst_p1_affine,
    blst_p1_affine_in_g1, blst_p1_affine_is_inf, blst_p1_uncompress, blst_p2_affine,
    blst_p2_affine_in_g2, blst_p2_affine_is_inf, blst_p2_uncompress, BLST_ERROR, BLS12_381_G1,
    BLS12_381_NEG_G2,
};
use sha3::{Digest, Keccak256};

/// Domain Separation Tag for churn request signatures (G1 signatures).
const DST: &[u8] = b"BLS_SIG_BLS12381G1_XMD:SHA-256_SSWU_RO_NUL_";

/// Domain separator prefixing every churn request hash.
const REQUEST_DOMAIN: &[u8] = b"ChurnRequest";

/// Keccak-256 hash function.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&hasher.finalize());
    hash
}

/// The message a candidate signs to authenticate its own churn request.
///
/// A pure function of `(pubkey_g1, pubkey_g2, salt)`; the salt binds the
/// signature to this one request so it cannot be replayed.
pub fn request_hash(pubkey_g1: &[u8; 48], pubkey_g2: &[u8; 96], salt: &[u8; 32]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(REQUEST_DOMAIN);
    hasher.update(pubkey_g1);
    hasher.update(pubkey_g2);
    hasher.update(salt);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&hasher.finalize());
    hash
}

/// Pairing-based equivalence proof for the candidate's two key encodings.
///
/// Accepts iff both encodings are valid, non-infinity group members and
/// `e(pk_g1, -g2_gen) * e(g1_gen, pk_g2)` final-exponentiates to one, i.e.
/// both points were produced from the same secret scalar. This is a
/// proof-of-possession check, not a byte comparison. Malformed encodings
/// are rejected rather than surfaced as a distinct error.
pub fn keys_equivalent(pubkey_g1: &[u8; 48], pubkey_g2: &[u8; 96]) -> bool {
    let mut g1 = blst_p1_affine::default();
    let mut g2 = blst_p2_affine::default();

    unsafe {
        if blst_p1_uncompress(&mut g1, pubkey_g1.as_ptr()) != BLST_ERROR::BLST_SUCCESS
            || blst_p2_uncompress(&mut g2, pubkey_g2.as_ptr()) != BLST_ERROR::BLST_SUCCESS
        {
            return false;
        }

        // Subgroup membership; the identity element never registers a key.
        if !blst_p1_affine_in_g1(&g1)
            || !blst_p2_affine_in_g2(&g2)
            || blst_p1_affine_is_inf(&g1)
            || blst_p2_affine_is_inf(&g2)
        {
            return false;
        }

        let mut left = blst_fp12::default();
        let mut right = blst_fp12::default();
        let mut acc = blst_fp12::default();
        let mut gt = blst_fp12::default();

        blst_miller_loop(&mut left, &BLS12_381_NEG_G2, &g1);
        blst_miller_loop(&mut right, &g2, &BLS12_381_G1);
        blst_fp12_mul(&mut acc, &left, &right);
        blst_final_exp(&mut gt, &acc);

        blst_fp12_is_one(&gt)
    }
}

/// Verify a candidate's signature over its request hash against its G2 key.
pub fn verify_request_signature(
    message_hash: &Hash,
    signature: &[u8; 48],
    pubkey_g2: &[u8; 96],
) -> bool {
    let Ok(sig) = Signature::from_bytes(signature) else {
        return false;
    };

    let Ok(pk) = PublicKey::from_bytes(pubkey_g2) else {
        return false;
    };

    sig.verify(true, message_hash, DST, &[], &pk, true) == BLST_ERROR::BLST_SUCCESS
}

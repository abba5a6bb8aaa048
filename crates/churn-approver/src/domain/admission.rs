//! # Admission Control
//!
//! Pure economic math of the churn decision: capacity gating, lowest-stake
//! incumbent selection, and the two basis-point thresholds a candidate must
//! clear before it may force that incumbent out.
//!
//! All stake arithmetic is integer-only. Products of a 256-bit stake and a
//! basis-point factor are compared as 512-bit values, so no check can
//! overflow or lose precision.

use super::entities::{OperatorId, OperatorStakeEntry, QuorumAdmissionParams, QuorumId};
use super::errors::ChurnError;
use primitive_types::U256;

/// Basis-point denominator: thresholds are expressed in units of 1/10000.
pub const BIPS_DENOMINATOR: u32 = 10_000;

/// The incumbent selected for churn, with the stake that selected it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncumbentToChurn {
    pub operator_id: OperatorId,
    pub stake: U256,
    pub total_stake: U256,
}

/// Capacity gate: a quorum churns when no seat is free.
///
/// A quorum below capacity admits the candidate without churn; an empty
/// stake list means no incumbents, never an error. A quorum over capacity
/// (the on-chain cap can be lowered under live incumbents) still churns.
pub fn quorum_is_full(
    quorum_id: QuorumId,
    params: &QuorumAdmissionParams,
    stakes: &[OperatorStakeEntry],
) -> Result<bool, ChurnError> {
    if params.max_operator_count == 0 {
        return Err(ChurnError::MisconfiguredQuorum(quorum_id));
    }
    Ok(stakes.len() as u32 >= params.max_operator_count)
}

/// Select the weakest incumbent of a full quorum and check that the
/// candidate may churn it out.
///
/// One pass computes the total stake and the argmin; among equal stakes the
/// entry encountered first wins, so the choice follows the ledger's list
/// ordering. Two checks then apply, both strict inequalities:
///
/// - relative stake: `lowest * churn_bips_of_operator_stake < candidate * 10000`,
///   i.e. the candidate must out-stake the weakest incumbent by more than
///   the configured margin;
/// - total stake: `lowest * 10000 < total * churn_bips_of_total_stake`,
///   i.e. an incumbent holding at least the configured share of the quorum
///   can never be forced out, whatever the candidate holds.
pub fn select_incumbent(
    quorum_id: QuorumId,
    params: &QuorumAdmissionParams,
    stakes: &[OperatorStakeEntry],
    candidate_stake: U256,
) -> Result<IncumbentToChurn, ChurnError> {
    let Some(first) = stakes.first() else {
        // Unreachable when the capacity gate passed; a full quorum with a
        // positive capacity has incumbents.
        return Err(ChurnError::LedgerRead(format!(
            "empty stake list for full quorum {quorum_id}"
        )));
    };

    let mut lowest_id = first.operator_id;
    let mut lowest = first.stake;
    let mut total = U256::zero();

    for entry in stakes {
        if entry.stake < lowest {
            lowest = entry.stake;
            lowest_id = entry.operator_id;
        }
        total = total.saturating_add(entry.stake);
    }

    let bips = U256::from(BIPS_DENOMINATOR);

    if lowest.full_mul(U256::from(params.churn_bips_of_operator_stake))
        >= candidate_stake.full_mul(bips)
    {
        return Err(ChurnError::InsufficientRelativeStake {
            quorum_id,
            candidate_stake,
            lowest_stake: lowest,
        });
    }

    if lowest.full_mul(bips) >= total.full_mul(U256::from(params.churn_bips_of_total_stake)) {
        return Err(ChurnError::IncumbentAboveChurnFloor {
            quorum_id,
            lowest_stake: lowest,
            total_stake: total,
        });
    }

    Ok(IncumbentToChurn {
        operator_id: lowest_id,
        stake: lowest,
        total_stake: total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u8, stake: u64) -> OperatorStakeEntry {
        OperatorStakeEntry {
            operator_id: [id; 32],
            stake: U256::from(stake),
        }
    }

    fn params(max: u32, operator_bips: u32, total_bips: u32) -> QuorumAdmissionParams {
        QuorumAdmissionParams {
            max_operator_count: max,
            churn_bips_of_operator_stake: operator_bips,
            churn_bips_of_total_stake: total_bips,
        }
    }

    #[test]
    fn zero_capacity_is_a_misconfiguration() {
        let result = quorum_is_full(3, &params(0, 11000, 1001), &[entry(1, 10)]);
        assert_eq!(result, Err(ChurnError::MisconfiguredQuorum(3)));
    }

    #[test]
    fn quorum_below_capacity_is_not_full() {
        let p = params(2, 11000, 1001);
        assert_eq!(quorum_is_full(0, &p, &[entry(1, 10)]), Ok(false));
        assert_eq!(quorum_is_full(0, &p, &[]), Ok(false));
    }

    #[test]
    fn quorum_at_capacity_is_full() {
        let p = params(2, 11000, 1001);
        assert_eq!(
            quorum_is_full(0, &p, &[entry(1, 10), entry(2, 20)]),
            Ok(true)
        );
    }

    #[test]
    fn quorum_over_capacity_is_full() {
        // A lowered on-chain cap can leave more incumbents than seats; the
        // quorum must still take the churn path.
        let p = params(1, 11000, 1001);
        assert_eq!(
            quorum_is_full(0, &p, &[entry(1, 10), entry(2, 20)]),
            Ok(true)
        );
    }

    #[test]
    fn single_incumbent_quorum_allows_churn() {
        // Incumbent holds 2, candidate holds 1, margin 20 bips (0.2%):
        // 2*20 < 1*10000 passes; 2*10000 < 2*20000 passes.
        let p = params(1, 20, 20_000);
        let selected =
            select_incumbent(0, &p, &[entry(1, 2)], U256::from(1)).expect("churn allowed");

        assert_eq!(selected.operator_id, [1; 32]);
        assert_eq!(selected.stake, U256::from(2));
        assert_eq!(selected.total_stake, U256::from(2));
    }

    #[test]
    fn weakest_incumbent_is_selected() {
        // Margin 110%: candidate 100 churns the 50-stake incumbent.
        let p = params(3, 11_000, 9_000);
        let stakes = [entry(1, 200), entry(2, 50), entry(3, 120)];

        let selected =
            select_incumbent(0, &p, &stakes, U256::from(100)).expect("churn allowed");

        assert_eq!(selected.operator_id, [2; 32]);
        assert_eq!(selected.stake, U256::from(50));
        assert_eq!(selected.total_stake, U256::from(370));
    }

    #[test]
    fn equal_stakes_break_ties_by_list_order() {
        let p = params(3, 11_000, 9_000);
        let stakes = [entry(7, 50), entry(8, 50), entry(9, 200)];

        let selected =
            select_incumbent(0, &p, &stakes, U256::from(100)).expect("churn allowed");

        // First-encountered entry wins the tie
        assert_eq!(selected.operator_id, [7; 32]);
    }

    #[test]
    fn relative_stake_check_is_strict() {
        // lowest * bips == candidate * 10000 exactly: denied.
        let p = params(1, 10_000, 20_000);
        let result = select_incumbent(4, &p, &[entry(1, 100)], U256::from(100));

        assert_eq!(
            result,
            Err(ChurnError::InsufficientRelativeStake {
                quorum_id: 4,
                candidate_stake: U256::from(100),
                lowest_stake: U256::from(100),
            })
        );
    }

    #[test]
    fn insufficient_candidate_stake_is_denied() {
        // Margin 110%: candidate 100 cannot churn a 95-stake incumbent.
        let p = params(2, 11_000, 9_000);
        let stakes = [entry(1, 95), entry(2, 300)];

        let result = select_incumbent(1, &p, &stakes, U256::from(100));
        assert!(matches!(
            result,
            Err(ChurnError::InsufficientRelativeStake { quorum_id: 1, .. })
        ));
    }

    #[test]
    fn dominant_incumbent_is_never_churned() {
        // Floor 10.01%: the weakest incumbent holds 50% of total stake, so
        // no candidate stake can churn it.
        let p = params(2, 11_000, 1_001);
        let stakes = [entry(1, 500), entry(2, 500)];

        let result = select_incumbent(2, &p, &stakes, U256::from(1_000_000));
        assert_eq!(
            result,
            Err(ChurnError::IncumbentAboveChurnFloor {
                quorum_id: 2,
                lowest_stake: U256::from(500),
                total_stake: U256::from(1000),
            })
        );
    }

    #[test]
    fn raising_candidate_stake_never_revokes_approval() {
        // Monotonicity of the relative-stake check: once a candidate stake
        // clears the margin, every larger stake clears it too.
        let p = params(3, 11_000, 9_000);
        let stakes = [entry(1, 200), entry(2, 50), entry(3, 120)];

        let mut approved = false;
        for candidate in 1u64..=300 {
            let result = select_incumbent(0, &p, &stakes, U256::from(candidate));
            if approved {
                assert!(
                    result.is_ok(),
                    "stake {candidate} denied after a smaller stake was approved"
                );
            } else {
                approved = result.is_ok();
            }
        }
        assert!(approved, "no candidate stake in range was approved");
    }

    #[test]
    fn huge_stakes_do_not_overflow_the_checks() {
        // Products of U256::MAX-scale stakes and bips factors exceed 256
        // bits; the comparison must still be exact.
        let p = params(2, 11_000, 9_000);
        let huge = U256::MAX / 2;
        let stakes = [
            OperatorStakeEntry {
                operator_id: [1; 32],
                stake: huge,
            },
            OperatorStakeEntry {
                operator_id: [2; 32],
                stake: huge - U256::from(1),
            },
        ];

        let result = select_incumbent(0, &p, &stakes, huge);
        // Candidate equals the second incumbent's stake + 1; margin of 110%
        // is not met, so this is a clean denial rather than an overflow.
        assert!(matches!(
            result,
            Err(ChurnError::InsufficientRelativeStake { .. })
        ));
    }
}

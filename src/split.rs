use thiserror::Error;

use crate::model::{Participant, MONEY_EPSILON};

/// Shares do not add up to the transaction amount.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Total shares ({total}) must equal transaction amount ({amount})")]
pub struct SplitMismatch {
    pub total: f64,
    pub amount: f64,
}

/// Check that participant shares sum to the transaction amount.
///
/// Drift up to [`MONEY_EPSILON`] is forgiven, so accumulated float error
/// like [33.33, 33.33, 33.34] against 100.00 passes, while [50.00, 50.01]
/// against 100.00 lands just past the tolerance and is rejected.
pub fn validate_split(amount: f64, participants: &[Participant]) -> Result<(), SplitMismatch> {
    let total: f64 = participants.iter().map(|p| p.share).sum();
    if (total - amount).abs() > MONEY_EPSILON {
        return Err(SplitMismatch { total, amount });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn shares(values: &[f64]) -> Vec<Participant> {
        values
            .iter()
            .map(|&share| Participant {
                user_id: Uuid::new_v4(),
                share,
                settled: false,
            })
            .collect()
    }

    #[test]
    fn exact_split_passes() {
        assert!(validate_split(100.0, &shares(&[50.0, 50.0])).is_ok());
    }

    #[test]
    fn uneven_cents_within_tolerance_pass() {
        assert!(validate_split(100.0, &shares(&[33.33, 33.33, 33.34])).is_ok());
    }

    #[test]
    fn drift_inside_the_tolerance_passes_either_side() {
        assert!(validate_split(100.0, &shares(&[50.0, 50.008])).is_ok());
        assert!(validate_split(100.0, &shares(&[49.997, 49.997])).is_ok());
    }

    #[test]
    fn one_cent_over_fails() {
        let err = validate_split(100.0, &shares(&[50.0, 50.01])).unwrap_err();
        assert!((err.total - 100.01).abs() < 1e-9);
        assert_eq!(err.amount, 100.0);
    }

    #[test]
    fn two_cents_under_fails() {
        assert!(validate_split(100.0, &shares(&[50.0, 49.98])).is_err());
    }

    #[test]
    fn empty_participants_only_match_zero() {
        assert!(validate_split(0.0, &[]).is_ok());
        assert!(validate_split(10.0, &[]).is_err());
    }

    #[test]
    fn single_participant_covers_the_whole_amount() {
        assert!(validate_split(42.5, &shares(&[42.5])).is_ok());
    }

    #[test]
    fn error_message_carries_both_figures() {
        let err = validate_split(100.0, &shares(&[60.0, 50.0])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Total shares (110) must equal transaction amount (100)"
        );
    }
}

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::model::{GroupMember, Settlement, Transaction, MONEY_EPSILON};

/// One non-settled pairwise balance, direction carried by the named fields
/// rather than a sign.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceEntry {
    pub user1: Uuid,
    pub user2: Uuid,
    pub amount: f64,
    pub owed_by: Uuid,
    pub owed_to: Uuid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSummary {
    pub total_owed: f64,
    pub total_owing: f64,
    pub net_balance: f64,
}

/// Everything a subject needs to know about who owes whom.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceSheet {
    pub balances: Vec<BalanceEntry>,
    pub summary: BalanceSummary,
}

impl BalanceSheet {
    /// Look up the entry against one counterparty, if it survived settling.
    pub fn entry_for(&self, counterparty: Uuid) -> Option<&BalanceEntry> {
        self.balances.iter().find(|b| b.user2 == counterparty)
    }
}

/// Compute the signed balance of `subject` against every counterparty from
/// the full transaction and settlement history, then fold the survivors into
/// owed/owing totals.
///
/// Pure function over a snapshot: the caller hands in slices, gets a fresh
/// sheet back. Accumulation is commutative, so record order never matters.
/// Internally positive means the counterparty owes the subject.
pub fn compute_balances(
    subject: Uuid,
    transactions: &[Transaction],
    settlements: &[Settlement],
) -> BalanceSheet {
    let mut per_counterparty: HashMap<Uuid, f64> = HashMap::new();

    for transaction in transactions {
        // Subject paid: every other participant owes their share.
        if transaction.paid_by == subject {
            for participant in &transaction.participants {
                if participant.user_id != subject {
                    *per_counterparty.entry(participant.user_id).or_insert(0.0) +=
                        participant.share;
                }
            }
        }

        // Subject took part without paying: they owe the payer their share.
        if transaction.paid_by != subject {
            if let Some(own) = transaction
                .participants
                .iter()
                .find(|p| p.user_id == subject)
            {
                *per_counterparty.entry(transaction.paid_by).or_insert(0.0) -= own.share;
            }
        }
    }

    // Two independent rules, not an else-if: a degenerate self-settlement
    // adds and subtracts the same amount and cancels to zero.
    for settlement in settlements {
        if settlement.paid_by == subject {
            *per_counterparty.entry(settlement.paid_to).or_insert(0.0) += settlement.amount;
        }
        if settlement.paid_to == subject {
            *per_counterparty.entry(settlement.paid_by).or_insert(0.0) -= settlement.amount;
        }
    }

    let mut balances = Vec::new();
    let mut total_owed = 0.0;
    let mut total_owing = 0.0;

    for (counterparty, balance) in per_counterparty {
        if balance.abs() <= MONEY_EPSILON {
            continue;
        }
        if balance > 0.0 {
            total_owed += balance;
        } else {
            total_owing += balance.abs();
        }
        let (owed_by, owed_to) = if balance < 0.0 {
            (subject, counterparty)
        } else {
            (counterparty, subject)
        };
        balances.push(BalanceEntry {
            user1: subject,
            user2: counterparty,
            amount: balance.abs(),
            owed_by,
            owed_to,
        });
    }

    BalanceSheet {
        balances,
        summary: BalanceSummary {
            total_owed,
            total_owing,
            net_balance: total_owed - total_owing,
        },
    }
}

/// Per-member balance against the group, from the group's transactions only.
/// Every member starts at zero so inactive members still show up. Positive
/// means the group collectively owes that member. Settlements are not scoped
/// to groups and do not offset these balances.
pub fn group_balances(
    members: &[GroupMember],
    transactions: &[Transaction],
) -> HashMap<Uuid, f64> {
    let mut balances: HashMap<Uuid, f64> = members.iter().map(|m| (m.user_id, 0.0)).collect();

    for transaction in transactions {
        if let Some(balance) = balances.get_mut(&transaction.paid_by) {
            *balance += transaction.amount;
        }
        for participant in &transaction.participants {
            if let Some(balance) = balances.get_mut(&participant.user_id) {
                *balance -= participant.share;
            }
        }
    }

    balances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MemberRole, Participant};
    use time::OffsetDateTime;

    fn tx(payer: Uuid, amount: f64, shares: &[(Uuid, f64)]) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            description: "test expense".into(),
            amount,
            category: "general".into(),
            paid_by: payer,
            participants: shares
                .iter()
                .map(|&(user_id, share)| Participant {
                    user_id,
                    share,
                    settled: false,
                })
                .collect(),
            group_id: None,
            date: OffsetDateTime::now_utc(),
            created_at: OffsetDateTime::now_utc(),
            created_by: payer,
            bank_transaction_id: None,
        }
    }

    fn settlement(payer: Uuid, payee: Uuid, amount: f64) -> Settlement {
        Settlement {
            id: Uuid::new_v4(),
            paid_by: payer,
            paid_to: payee,
            amount,
            note: String::new(),
            group_id: None,
            date: OffsetDateTime::now_utc(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn member(user_id: Uuid) -> GroupMember {
        GroupMember {
            user_id,
            role: MemberRole::Member,
            joined_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn empty_history_is_all_settled() {
        let sheet = compute_balances(Uuid::new_v4(), &[], &[]);
        assert!(sheet.balances.is_empty());
        assert_eq!(sheet.summary.total_owed, 0.0);
        assert_eq!(sheet.summary.total_owing, 0.0);
        assert_eq!(sheet.summary.net_balance, 0.0);
    }

    #[test]
    fn three_way_split_from_the_payer_side() {
        let (u1, u2, u3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let transactions = [tx(u1, 300.0, &[(u1, 100.0), (u2, 100.0), (u3, 100.0)])];

        let sheet = compute_balances(u1, &transactions, &[]);

        let b2 = sheet.entry_for(u2).expect("u2 entry");
        assert!((b2.amount - 100.0).abs() < 1e-9);
        assert_eq!(b2.owed_by, u2);
        assert_eq!(b2.owed_to, u1);

        let b3 = sheet.entry_for(u3).expect("u3 entry");
        assert!((b3.amount - 100.0).abs() < 1e-9);

        assert!((sheet.summary.total_owed - 200.0).abs() < 1e-9);
        assert_eq!(sheet.summary.total_owing, 0.0);
        assert!((sheet.summary.net_balance - 200.0).abs() < 1e-9);
    }

    #[test]
    fn payer_self_share_contributes_nothing() {
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());
        let transactions = [tx(u1, 100.0, &[(u1, 60.0), (u2, 40.0)])];

        let sheet = compute_balances(u1, &transactions, &[]);

        // Only the counterparty shows up; the payer's own share is skipped.
        assert!(sheet.entry_for(u1).is_none());
        assert!((sheet.summary.total_owed - 40.0).abs() < 1e-9);
        assert_eq!(sheet.summary.total_owing, 0.0);
    }

    #[test]
    fn participant_owes_the_payer() {
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());
        let transactions = [tx(u1, 100.0, &[(u1, 50.0), (u2, 50.0)])];

        let sheet = compute_balances(u2, &transactions, &[]);

        let entry = sheet.entry_for(u1).expect("u1 entry");
        assert!((entry.amount - 50.0).abs() < 1e-9);
        assert_eq!(entry.owed_by, u2);
        assert_eq!(entry.owed_to, u1);
        assert_eq!(sheet.summary.total_owed, 0.0);
        assert!((sheet.summary.total_owing - 50.0).abs() < 1e-9);
        assert!((sheet.summary.net_balance + 50.0).abs() < 1e-9);
    }

    #[test]
    fn balances_are_symmetric_between_subjects() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let transactions = [
            tx(a, 90.0, &[(a, 30.0), (b, 30.0), (c, 30.0)]),
            tx(b, 40.0, &[(a, 20.0), (b, 20.0)]),
        ];
        let settlements = [settlement(c, a, 10.0)];

        let from_a = compute_balances(a, &transactions, &settlements);
        let from_b = compute_balances(b, &transactions, &settlements);

        let a_about_b = from_a.entry_for(b).expect("a->b entry");
        let b_about_a = from_b.entry_for(a).expect("b->a entry");
        assert!((a_about_b.amount - b_about_a.amount).abs() < 1e-9);
        assert_eq!(a_about_b.owed_by, b_about_a.owed_by);
        assert_eq!(a_about_b.owed_to, b_about_a.owed_to);
    }

    #[test]
    fn exact_settlement_drops_the_pair() {
        let (u1, u2, u3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let transactions = [tx(u1, 300.0, &[(u1, 100.0), (u2, 100.0), (u3, 100.0)])];
        let settlements = [settlement(u2, u1, 100.0)];

        let sheet = compute_balances(u1, &transactions, &settlements);

        assert!(sheet.entry_for(u2).is_none(), "u2 should be settled");
        let b3 = sheet.entry_for(u3).expect("u3 entry");
        assert!((b3.amount - 100.0).abs() < 1e-9);
        assert!((sheet.summary.total_owed - 100.0).abs() < 1e-9);

        // And from the other side as well.
        let other = compute_balances(u2, &transactions, &settlements);
        assert!(other.entry_for(u1).is_none(), "u1 should be settled for u2");
    }

    #[test]
    fn overpaid_settlement_flips_the_direction() {
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());
        let transactions = [tx(u1, 100.0, &[(u1, 50.0), (u2, 50.0)])];
        // u2 owed 50 but pays 80 back.
        let settlements = [settlement(u2, u1, 80.0)];

        let sheet = compute_balances(u2, &transactions, &settlements);

        let entry = sheet.entry_for(u1).expect("u1 entry");
        assert!((entry.amount - 30.0).abs() < 1e-9);
        assert_eq!(entry.owed_by, u1, "u1 now owes u2 the surplus");
        assert_eq!(entry.owed_to, u2);
    }

    #[test]
    fn sub_cent_residue_counts_as_settled() {
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());
        let transactions = [tx(u1, 20.0, &[(u1, 10.0), (u2, 10.0)])];
        let settlements = [settlement(u2, u1, 9.995)];

        let sheet = compute_balances(u1, &transactions, &settlements);
        assert!(sheet.entry_for(u2).is_none());
        assert_eq!(sheet.summary.total_owed, 0.0);
    }

    #[test]
    fn self_settlement_cancels_to_zero() {
        let u = Uuid::new_v4();
        let settlements = [settlement(u, u, 25.0)];

        let sheet = compute_balances(u, &[], &settlements);
        assert!(sheet.balances.is_empty());
    }

    #[test]
    fn unrelated_transactions_are_ignored() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let transactions = [tx(b, 60.0, &[(b, 30.0), (c, 30.0)])];

        let sheet = compute_balances(a, &transactions, &[]);
        assert!(sheet.balances.is_empty());
    }

    #[test]
    fn unknown_counterparty_ids_still_count() {
        let subject = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let transactions = [tx(subject, 50.0, &[(stranger, 50.0)])];

        let sheet = compute_balances(subject, &transactions, &[]);
        let entry = sheet.entry_for(stranger).expect("stranger entry");
        assert!((entry.amount - 50.0).abs() < 1e-9);
    }

    #[test]
    fn group_with_no_transactions_is_all_zeros() {
        let (m1, m2, m3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let members = [member(m1), member(m2), member(m3)];

        let balances = group_balances(&members, &[]);

        assert_eq!(balances.len(), 3);
        assert_eq!(balances[&m1], 0.0);
        assert_eq!(balances[&m2], 0.0);
        assert_eq!(balances[&m3], 0.0);
    }

    #[test]
    fn group_payer_gains_amount_and_participants_lose_shares() {
        let (m1, m2, m3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let members = [member(m1), member(m2), member(m3)];
        let transactions = [tx(m1, 90.0, &[(m1, 30.0), (m2, 30.0), (m3, 30.0)])];

        let balances = group_balances(&members, &transactions);

        assert!((balances[&m1] - 60.0).abs() < 1e-9);
        assert!((balances[&m2] + 30.0).abs() < 1e-9);
        assert!((balances[&m3] + 30.0).abs() < 1e-9);
    }

    #[test]
    fn group_ignores_non_member_payers_and_participants() {
        let (m1, m2) = (Uuid::new_v4(), Uuid::new_v4());
        let outsider = Uuid::new_v4();
        let members = [member(m1), member(m2)];
        let transactions = [
            tx(outsider, 50.0, &[(m1, 25.0), (outsider, 25.0)]),
            tx(m1, 30.0, &[(m2, 15.0), (outsider, 15.0)]),
        ];

        let balances = group_balances(&members, &transactions);

        assert_eq!(balances.len(), 2);
        // m1: -25 as participant, +30 as payer.
        assert!((balances[&m1] - 5.0).abs() < 1e-9);
        assert!((balances[&m2] + 15.0).abs() < 1e-9);
    }

    #[test]
    fn group_member_balances_sum_to_zero_for_internal_splits() {
        let (m1, m2, m3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let members = [member(m1), member(m2), member(m3)];
        let transactions = [
            tx(m1, 90.0, &[(m1, 30.0), (m2, 30.0), (m3, 30.0)]),
            tx(m2, 45.0, &[(m1, 15.0), (m2, 15.0), (m3, 15.0)]),
        ];

        let balances = group_balances(&members, &transactions);
        let total: f64 = balances.values().sum();
        assert!(total.abs() < 1e-9, "internal splits form a closed system");
    }
}

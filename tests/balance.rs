use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use tripsplit::{compute_balances, ExpenseRecord, InvalidExpense};

fn expense(id: i64, payer: &str, amount: f64, split_with: &[&str]) -> ExpenseRecord {
    ExpenseRecord {
        id,
        trip_id: 1,
        description: String::new(),
        amount,
        payer: payer.to_owned(),
        split_with: split_with.iter().map(|name| (*name).to_owned()).collect(),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
    }
}

fn map(entries: &[(&str, f64)]) -> HashMap<String, f64> {
    entries
        .iter()
        .map(|(name, value)| ((*name).to_owned(), *value))
        .collect()
}

#[test]
fn three_way_split_credits_payer_with_the_rest() {
    let expenses = vec![expense(1, "alice", 90.0, &["bob", "charlie"])];
    let balances = compute_balances(&expenses).unwrap();
    assert_eq!(
        balances,
        map(&[("alice", 60.0), ("bob", -30.0), ("charlie", -30.0)])
    );
}

#[test]
fn mutual_expenses_cancel_out() {
    let expenses = vec![
        expense(1, "alice", 30.0, &["bob"]),
        expense(2, "bob", 30.0, &["alice"]),
    ];
    let balances = compute_balances(&expenses).unwrap();
    assert_eq!(balances, map(&[("alice", 0.0), ("bob", 0.0)]));
}

#[test]
fn empty_expense_list_yields_empty_map() {
    let balances = compute_balances(&[]).unwrap();
    assert!(balances.is_empty());
}

#[test]
fn self_paid_expense_nets_payer_zero() {
    let expenses = vec![expense(1, "alice", 42.0, &[])];
    let balances = compute_balances(&expenses).unwrap();
    assert_eq!(balances, map(&[("alice", 0.0)]));
}

#[test]
fn zero_amount_contributes_nothing() {
    let expenses = vec![expense(1, "alice", 0.0, &["bob"])];
    let balances = compute_balances(&expenses).unwrap();
    assert_eq!(balances, map(&[("alice", 0.0), ("bob", 0.0)]));
}

#[test]
fn absent_participants_get_no_entry() {
    let expenses = vec![expense(1, "alice", 10.0, &["bob"])];
    let balances = compute_balances(&expenses).unwrap();
    assert!(!balances.contains_key("charlie"));
}

#[test]
fn names_are_compared_literally() {
    let expenses = vec![
        expense(1, "Alice", 10.0, &["bob"]),
        expense(2, "alice", 10.0, &["bob"]),
    ];
    let balances = compute_balances(&expenses).unwrap();
    assert_eq!(balances.len(), 3);
    assert!(balances.contains_key("Alice"));
    assert!(balances.contains_key("alice"));
}

#[test]
fn negative_amount_is_rejected() {
    let expenses = vec![expense(7, "alice", -5.0, &["bob"])];
    assert_eq!(
        compute_balances(&expenses),
        Err(InvalidExpense::NegativeAmount {
            id: 7,
            amount: -5.0
        })
    );
}

#[test]
fn non_finite_amount_is_rejected() {
    let expenses = vec![expense(8, "alice", f64::NAN, &["bob"])];
    assert_eq!(
        compute_balances(&expenses),
        Err(InvalidExpense::NonFiniteAmount { id: 8 })
    );
}

#[test]
fn payer_listed_in_split_is_rejected() {
    let expenses = vec![expense(9, "alice", 12.0, &["alice", "bob"])];
    assert_eq!(
        compute_balances(&expenses),
        Err(InvalidExpense::PayerInSplit {
            id: 9,
            payer: "alice".to_owned()
        })
    );
}

#[test]
fn failure_means_no_partial_result() {
    let expenses = vec![
        expense(1, "alice", 30.0, &["bob"]),
        expense(2, "bob", -1.0, &[]),
    ];
    assert!(compute_balances(&expenses).is_err());
}

const NAMES: [&str; 4] = ["alice", "bob", "charlie", "diana"];

fn arbitrary_expense() -> impl Strategy<Value = ExpenseRecord> {
    (0usize..NAMES.len(), 0u8..16, 0.0f64..10_000.0).prop_map(|(payer_idx, mask, amount)| {
        let split_with: Vec<&str> = NAMES
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != payer_idx && mask & (1 << idx) != 0)
            .map(|(_, name)| *name)
            .collect();
        expense(payer_idx as i64, NAMES[payer_idx], amount, &split_with)
    })
}

fn expenses_with_permutation(
) -> impl Strategy<Value = (Vec<ExpenseRecord>, Vec<ExpenseRecord>)> {
    proptest::collection::vec(arbitrary_expense(), 0..12)
        .prop_flat_map(|expenses| (Just(expenses.clone()), Just(expenses).prop_shuffle()))
}

proptest! {
    #[test]
    fn permuting_the_input_yields_an_identical_map(
        (expenses, shuffled) in expenses_with_permutation()
    ) {
        let original = compute_balances(&expenses).unwrap();
        let permuted = compute_balances(&shuffled).unwrap();
        prop_assert_eq!(original, permuted);
    }

    #[test]
    fn balances_sum_to_zero(expenses in proptest::collection::vec(arbitrary_expense(), 0..12)) {
        let balances = compute_balances(&expenses).unwrap();
        let total: f64 = balances.values().sum();
        prop_assert!(total.abs() < 1e-6, "total was {}", total);
    }

    #[test]
    fn recomputation_is_idempotent(expenses in proptest::collection::vec(arbitrary_expense(), 0..12)) {
        let first = compute_balances(&expenses).unwrap();
        let second = compute_balances(&expenses).unwrap();
        prop_assert_eq!(first, second);
    }
}

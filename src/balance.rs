use std::collections::HashMap;

use thiserror::Error;

use crate::schemas::ExpenseRecord;

/// Net position per participant: positive is owed money, negative owes,
/// absent means the name never appeared in any expense.
pub type BalanceMap = HashMap<String, f64>;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum InvalidExpense {
    #[error("expense {id}: negative amount {amount}")]
    NegativeAmount { id: i64, amount: f64 },
    #[error("expense {id}: amount is not a finite number")]
    NonFiniteAmount { id: i64 },
    #[error("expense {id}: payer {payer:?} also listed in split_with")]
    PayerInSplit { id: i64, payer: String },
}

/// Folds a trip's expenses into a fresh balance map.
///
/// Each expense is split equally over `split_with.len() + 1` people: the
/// payer is credited `amount - share` and every split participant is
/// debited `share`. An expense with an empty `split_with` is self-paid
/// and nets the payer exactly zero.
///
/// Contributions are summed in a canonical order, so any permutation of
/// the input produces a bit-identical map.
pub fn compute_balances(expenses: &[ExpenseRecord]) -> Result<BalanceMap, InvalidExpense> {
    let mut contributions: Vec<(&str, f64)> = Vec::new();

    for expense in expenses {
        validate(expense)?;
        let participants = (expense.split_with.len() + 1) as f64;
        let share = expense.amount / participants;
        contributions.push((expense.payer.as_str(), expense.amount - share));
        for name in &expense.split_with {
            contributions.push((name.as_str(), -share));
        }
    }

    contributions.sort_by(|(name_a, delta_a), (name_b, delta_b)| {
        name_a.cmp(name_b).then(delta_a.total_cmp(delta_b))
    });

    let mut balances = BalanceMap::new();
    for (name, delta) in contributions {
        *balances.entry(name.to_owned()).or_insert(0.0) += delta;
    }
    Ok(balances)
}

fn validate(expense: &ExpenseRecord) -> Result<(), InvalidExpense> {
    if !expense.amount.is_finite() {
        return Err(InvalidExpense::NonFiniteAmount { id: expense.id });
    }
    if expense.amount < 0.0 {
        return Err(InvalidExpense::NegativeAmount {
            id: expense.id,
            amount: expense.amount,
        });
    }
    if expense.split_with.contains(&expense.payer) {
        return Err(InvalidExpense::PayerInSplit {
            id: expense.id,
            payer: expense.payer.clone(),
        });
    }
    Ok(())
}

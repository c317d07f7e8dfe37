//! Account-level heuristics: unusual activity profiles and suspicious
//! holes in the chart of accounts actually used.

use crate::models::{AccountingGap, Entry, UnusualAccountActivity};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

const LOW_VOLUME_MAX_TRANSACTIONS: usize = 5;
const HIGH_VALUE_TOTAL: i64 = 100_000;
const IMBALANCE_MIN_AMOUNT: i64 = 10_000;
const GAP_MIN: u64 = 10;
const GAP_MAX: u64 = 100;

#[derive(Default)]
struct AccountActivity {
    transactions: usize,
    total_debit: Decimal,
    total_credit: Decimal,
}

/// Flag accounts with few but large transactions, and accounts whose debit
/// and credit totals are far apart. Both may fire for one account.
pub fn detect_unusual_account_activity(entries: &[Entry]) -> Vec<UnusualAccountActivity> {
    let mut activity: BTreeMap<&str, AccountActivity> = BTreeMap::new();

    for entry in entries {
        if entry.account.is_empty() {
            continue;
        }
        let account = activity.entry(entry.account.as_str()).or_default();
        account.transactions += 1;
        account.total_debit += entry.debit;
        account.total_credit += entry.credit;
    }

    let high_value = Decimal::from(HIGH_VALUE_TOTAL);
    let imbalance_floor = Decimal::from(IMBALANCE_MIN_AMOUNT);
    let imbalance_ratio = Decimal::new(1, 1);
    let mut unusual = Vec::new();

    for (account, stats) in activity {
        if stats.transactions < LOW_VOLUME_MAX_TRANSACTIONS
            && (stats.total_debit > high_value || stats.total_credit > high_value)
        {
            unusual.push(UnusualAccountActivity::LowVolumeHighValue {
                account: account.to_string(),
                transactions: stats.transactions,
                total_amount: stats.total_debit + stats.total_credit,
            });
        }

        let balance = stats.total_debit - stats.total_credit;
        let volume = stats.total_debit + stats.total_credit;
        if balance.abs() > imbalance_floor && balance.abs() > volume * imbalance_ratio {
            unusual.push(UnusualAccountActivity::SignificantImbalance {
                account: account.to_string(),
                balance,
                ratio: (balance.abs() / volume).round_dp(4),
            });
        }
    }

    debug!("Unusual account activity detector: {} findings", unusual.len());
    unusual
}

/// Numeric value of an account's digits, 0 when it has none.
fn account_value(account: &str) -> u64 {
    let digits: String = account.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

/// Within each account class (first character), report consecutive used
/// accounts separated by more than 10 and less than 100.
pub fn find_accounting_gaps(entries: &[Entry]) -> Vec<AccountingGap> {
    let used: BTreeSet<&str> = entries
        .iter()
        .map(|e| e.account.as_str())
        .filter(|a| !a.is_empty())
        .collect();

    let mut classes: BTreeMap<char, Vec<(&str, u64)>> = BTreeMap::new();
    for account in used {
        if let Some(class) = account.chars().next() {
            classes
                .entry(class)
                .or_default()
                .push((account, account_value(account)));
        }
    }

    let mut gaps = Vec::new();
    for (class, mut accounts) in classes {
        accounts.sort_by_key(|(_, value)| *value);
        for pair in accounts.windows(2) {
            let ((prev, prev_value), (curr, curr_value)) = (pair[0], pair[1]);
            if prev_value == 0 || curr_value == 0 {
                continue;
            }
            let diff = curr_value - prev_value;
            if diff > GAP_MIN && diff < GAP_MAX {
                gaps.push(AccountingGap {
                    class: class.to_string(),
                    from: prev.to_string(),
                    to: curr.to_string(),
                    gap: diff - 1,
                });
            }
        }
    }

    debug!("Accounting gap detector: {} findings", gaps.len());
    gaps
}

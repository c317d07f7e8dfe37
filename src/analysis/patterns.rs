//! Recurring amounts and suspicious digit shapes.

use crate::models::{AmountPatterns, DigitPattern, Entry, FrequentAmount};
use rust_decimal::Decimal;
use std::cmp::Reverse;
use std::collections::BTreeMap;

const MIN_OCCURRENCES: usize = 3;
const TOP_FREQUENT_AMOUNTS: usize = 10;
const FREQUENT_AMOUNT_EXAMPLES: usize = 5;
const PATTERN_EXAMPLES: usize = 3;
const MIN_RUN: usize = 3;
const MIN_PALINDROME_DIGITS: usize = 4;

/// Label of the palindromic digit pattern.
pub const SYMMETRIC_PATTERN: &str = "symmetric";

/// Runs of at least three identical consecutive digits, as `(length, digit)`.
fn repeated_digit_runs(digits: &str) -> Vec<(usize, char)> {
    let mut runs = Vec::new();
    let mut chars = digits.chars().peekable();

    while let Some(c) = chars.next() {
        if !c.is_ascii_digit() {
            continue;
        }
        let mut len = 1;
        while chars.peek() == Some(&c) {
            chars.next();
            len += 1;
        }
        if len >= MIN_RUN {
            runs.push((len, c));
        }
    }
    runs
}

/// Digit string (decimal point removed) reading the same both ways.
fn is_palindrome(rendered: &str) -> bool {
    let digits: Vec<char> = rendered.chars().filter(char::is_ascii_digit).collect();
    digits.len() >= MIN_PALINDROME_DIGITS && digits.iter().eq(digits.iter().rev())
}

#[derive(Default)]
struct AmountCount {
    count: usize,
    entries: Vec<Entry>,
}

#[derive(Default)]
struct PatternCount {
    count: usize,
    examples: Vec<Decimal>,
}

impl PatternCount {
    fn record(&mut self, amount: Decimal) {
        self.count += 1;
        if self.examples.len() < PATTERN_EXAMPLES {
            self.examples.push(amount);
        }
    }
}

/// Scan every positive debit and credit for recurring values and digit
/// patterns (repeated runs such as `1111`, palindromes such as `1221`).
pub fn detect_amount_patterns(entries: &[Entry]) -> AmountPatterns {
    let mut amounts: BTreeMap<Decimal, AmountCount> = BTreeMap::new();
    let mut patterns: BTreeMap<String, PatternCount> = BTreeMap::new();

    for entry in entries {
        for amount in [entry.debit, entry.credit] {
            if amount <= Decimal::ZERO {
                continue;
            }
            let rounded = amount.round_dp(2).normalize();

            let slot = amounts.entry(rounded).or_default();
            slot.count += 1;
            if slot.entries.len() < FREQUENT_AMOUNT_EXAMPLES {
                slot.entries.push(entry.clone());
            }

            let rendered = rounded.to_string();
            for (len, digit) in repeated_digit_runs(&rendered) {
                patterns
                    .entry(format!("{}x{}", len, digit))
                    .or_default()
                    .record(rounded);
            }
            if is_palindrome(&rendered) {
                patterns
                    .entry(SYMMETRIC_PATTERN.to_string())
                    .or_default()
                    .record(rounded);
            }
        }
    }

    let mut frequent_amounts: Vec<FrequentAmount> = amounts
        .into_iter()
        .filter(|(_, slot)| slot.count >= MIN_OCCURRENCES)
        .map(|(amount, slot)| FrequentAmount {
            amount,
            count: slot.count,
            entries: slot.entries,
        })
        .collect();
    frequent_amounts.sort_by_key(|a| Reverse(a.count));
    frequent_amounts.truncate(TOP_FREQUENT_AMOUNTS);

    let mut patterns: Vec<DigitPattern> = patterns
        .into_iter()
        .filter(|(_, p)| p.count >= MIN_OCCURRENCES)
        .map(|(pattern, p)| DigitPattern {
            pattern,
            count: p.count,
            examples: p.examples,
        })
        .collect();
    patterns.sort_by_key(|p| Reverse(p.count));

    AmountPatterns {
        frequent_amounts,
        patterns,
    }
}

//! First-digit test against Benford's law.

use crate::models::{BenfordAnalysis, BenfordDeviation, Entry};
use rust_decimal::Decimal;
use tracing::debug;

/// Expected frequency of leading digits 1 through 9.
pub const BENFORD_EXPECTED: [f64; 9] = [0.301, 0.176, 0.125, 0.097, 0.079, 0.067, 0.058, 0.051, 0.046];

/// Absolute deviation above which a digit is reported.
pub const DEVIATION_THRESHOLD: f64 = 0.05;

/// First nonzero digit of an amount, ignoring the decimal point.
pub fn first_significant_digit(amount: Decimal) -> Option<u8> {
    amount
        .abs()
        .normalize()
        .to_string()
        .chars()
        .find(|c| matches!(c, '1'..='9'))
        .and_then(|c| c.to_digit(10))
        .map(|d| d as u8)
}

/// Compare the leading-digit distribution of all positive amounts with
/// Benford's expectation.
pub fn check_benford_law(entries: &[Entry]) -> BenfordAnalysis {
    let mut counts = [0usize; 9];
    let mut sample_size = 0usize;

    for entry in entries {
        let amount = entry.amount().abs();
        if amount.is_zero() {
            continue;
        }
        sample_size += 1;
        if let Some(digit) = first_significant_digit(amount) {
            counts[usize::from(digit) - 1] += 1;
        }
    }

    let mut distribution = [0.0f64; 9];
    if sample_size > 0 {
        for (slot, count) in distribution.iter_mut().zip(counts) {
            *slot = count as f64 / sample_size as f64;
        }
    }

    let deviations: Vec<BenfordDeviation> = if sample_size == 0 {
        Vec::new()
    } else {
        distribution
            .iter()
            .zip(BENFORD_EXPECTED)
            .enumerate()
            .filter_map(|(i, (&observed, expected))| {
                let deviation = (observed - expected).abs();
                (deviation > DEVIATION_THRESHOLD).then(|| BenfordDeviation {
                    digit: i as u8 + 1,
                    expected,
                    observed,
                    deviation,
                })
            })
            .collect()
    };

    debug!(
        "Benford checker: {} amounts, {} deviating digits",
        sample_size,
        deviations.len()
    );

    BenfordAnalysis {
        sample_size,
        significant_deviation: !deviations.is_empty(),
        deviations,
        first_digit_distribution: distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::fixtures::{dec, entry};
    use crate::models::Entry;

    fn amounts_with_leading_digits(counts: [usize; 9]) -> Vec<Entry> {
        let mut entries = Vec::new();
        for (i, count) in counts.iter().enumerate() {
            let digit = i + 1;
            for n in 0..*count {
                // vary the tail so amounts are not all identical
                let amount = format!("{}{:03}.{:02}", digit, n % 1000, n % 100);
                entries.push(entry("VT", &n.to_string(), "411000", &amount, "0"));
            }
        }
        entries
    }

    #[test]
    fn test_first_significant_digit() {
        assert_eq!(first_significant_digit(dec("4321.50")), Some(4));
        assert_eq!(first_significant_digit(dec("0.07")), Some(7));
        assert_eq!(first_significant_digit(dec("-12")), Some(1));
        assert_eq!(first_significant_digit(Decimal::ZERO), None);
    }

    #[test]
    fn test_uniform_digits_deviate() {
        let analysis = check_benford_law(&amounts_with_leading_digits([100; 9]));

        assert_eq!(analysis.sample_size, 900);
        assert!(analysis.significant_deviation);
        assert!(analysis.deviations.iter().any(|d| d.digit == 1));
    }

    #[test]
    fn test_benford_distribution_conforms() {
        let analysis =
            check_benford_law(&amounts_with_leading_digits([301, 176, 125, 97, 79, 67, 58, 51, 46]));

        assert_eq!(analysis.sample_size, 1000);
        assert!(!analysis.significant_deviation);
        assert!(analysis.deviations.is_empty());
        assert!((analysis.first_digit_distribution[0] - 0.301).abs() < 1e-9);
    }

    #[test]
    fn test_empty_sample_has_zero_frequencies() {
        let analysis = check_benford_law(&[entry("VT", "1", "411000", "0", "0")]);

        assert_eq!(analysis.sample_size, 0);
        assert_eq!(analysis.first_digit_distribution, [0.0; 9]);
        assert!(!analysis.significant_deviation);
    }
}

//! Circular fund movement detection.
//!
//! Transfer labels often name the counterpart account. Those references are
//! turned into a directed account graph, which is then searched for closed
//! circuits (A -> B -> C -> A). Extraction is heuristic: labels that do not
//! embed account numbers simply contribute no edge.

use crate::models::{Entry, FlaggedEntry, TransactionPatterns};
use regex::Regex;
use std::collections::{btree_set, BTreeMap, BTreeSet};
use std::sync::OnceLock;
use tracing::debug;

/// Label fragments marking a transfer (`transfer` also covers `transfert`).
pub const TRANSFER_KEYWORDS: &[&str] = &["virement", "transfer"];

/// Deepest node depth the circuit search expands from.
pub const MAX_DEPTH: usize = 5;

const MAX_TRANSFERS: usize = 20;
const MAX_CIRCUITS: usize = 10;

type AccountGraph = BTreeMap<String, BTreeSet<String>>;

fn account_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d{3,}(?:\.\d+)?\b").expect("valid account token regex"))
}

fn is_transfer_label(label: &str) -> bool {
    TRANSFER_KEYWORDS.iter().any(|kw| label.contains(kw))
}

/// First numeric token of the label that is not the entry's own account.
fn counterpart_account<'l>(label: &'l str, own_account: &str) -> Option<&'l str> {
    account_token_regex()
        .find_iter(label)
        .map(|m| m.as_str())
        .find(|token| *token != own_account)
}

/// Collect transfer-like entries, infer account relations from their labels
/// and search the resulting graph for closed circuits.
pub fn detect_suspicious_patterns(entries: &[Entry]) -> TransactionPatterns {
    let mut transfers = Vec::new();
    let mut graph: AccountGraph = BTreeMap::new();

    for (index, entry) in entries.iter().enumerate() {
        if entry.account.is_empty() {
            continue;
        }
        let label = entry.label_lowercase();
        if !is_transfer_label(&label) {
            continue;
        }
        if entry.debit.is_zero() && entry.credit.is_zero() {
            continue;
        }

        transfers.push(FlaggedEntry {
            index,
            entry: entry.clone(),
        });

        if let Some(other) = counterpart_account(&label, &entry.account) {
            graph
                .entry(entry.account.clone())
                .or_default()
                .insert(other.to_string());
        }
    }

    let circuits = find_circuits(&graph);

    debug!(
        "Circuit detector: {} transfers, {} relations, {} circuits",
        transfers.len(),
        graph.values().map(BTreeSet::len).sum::<usize>(),
        circuits.len()
    );

    transfers.truncate(MAX_TRANSFERS);
    TransactionPatterns {
        transfers,
        suspicious_circuits: circuits.into_iter().take(MAX_CIRCUITS).collect(),
    }
}

/// Depth-bounded search from every account for paths returning to their
/// start. A path never revisits an account; each recorded circuit ends with
/// its starting account.
pub fn find_circuits(graph: &AccountGraph) -> Vec<Vec<String>> {
    let mut circuits = Vec::new();

    for start in graph.keys() {
        let mut path: Vec<&str> = vec![start.as_str()];
        let mut stack: Vec<btree_set::Iter<'_, String>> = vec![graph[start].iter()];

        while let Some(neighbours) = stack.last_mut() {
            let Some(next) = neighbours.next() else {
                stack.pop();
                path.pop();
                continue;
            };

            if next == start {
                if path.len() > 2 {
                    let mut circuit: Vec<String> = path.iter().map(|a| a.to_string()).collect();
                    circuit.push(start.clone());
                    circuits.push(circuit);
                }
                continue;
            }

            if path.contains(&next.as_str()) || path.len() > MAX_DEPTH {
                continue;
            }

            if let Some(onward) = graph.get(next) {
                path.push(next.as_str());
                stack.push(onward.iter());
            }
        }
    }

    circuits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::fixtures::labelled;

    fn graph_of(edges: &[(&str, &str)]) -> AccountGraph {
        let mut graph: AccountGraph = BTreeMap::new();
        for (from, to) in edges {
            graph
                .entry(from.to_string())
                .or_default()
                .insert(to.to_string());
        }
        graph
    }

    #[test]
    fn test_counterpart_account_skips_own_account() {
        assert_eq!(
            counterpart_account("virement 512000 vers 512100", "512000"),
            Some("512100")
        );
        assert_eq!(counterpart_account("virement interne", "512000"), None);
        assert_eq!(counterpart_account("virement 12 juin", "512000"), None);
    }

    #[test]
    fn test_three_account_circuit() {
        let graph = graph_of(&[("A", "B"), ("B", "C"), ("C", "A")]);

        let circuits = find_circuits(&graph);

        assert_eq!(circuits.len(), 3);
        assert_eq!(circuits[0], vec!["A", "B", "C", "A"]);
        assert_eq!(circuits[1], vec!["B", "C", "A", "B"]);
    }

    #[test]
    fn test_two_account_round_trip_is_not_a_circuit() {
        let graph = graph_of(&[("A", "B"), ("B", "A")]);
        assert!(find_circuits(&graph).is_empty());
    }

    #[test]
    fn test_depth_cap() {
        // 7 accounts in a ring: too long to close within the depth cap
        let ring: Vec<String> = (0..7).map(|i| format!("N{}", i)).collect();
        let edges: Vec<(&str, &str)> = (0..7)
            .map(|i| (ring[i].as_str(), ring[(i + 1) % 7].as_str()))
            .collect();
        assert!(find_circuits(&graph_of(&edges)).is_empty());

        // 6 accounts close exactly at the deepest expandable node
        let ring: Vec<String> = (0..6).map(|i| format!("N{}", i)).collect();
        let edges: Vec<(&str, &str)> = (0..6)
            .map(|i| (ring[i].as_str(), ring[(i + 1) % 6].as_str()))
            .collect();
        assert_eq!(find_circuits(&graph_of(&edges)).len(), 6);
    }

    #[test]
    fn test_detect_suspicious_patterns_from_labels() {
        let entries = vec![
            labelled("Virement vers 512200", "512100", "1000"),
            labelled("Virement vers 512300", "512200", "1000"),
            labelled("Transfert vers 512100", "512300", "1000"),
            labelled("Virement sans montant 512100", "512400", "0"),
            labelled("Facture 512100", "411000", "1000"),
        ];

        let patterns = detect_suspicious_patterns(&entries);

        assert_eq!(patterns.transfers.len(), 3);
        assert_eq!(patterns.suspicious_circuits.len(), 3);
        assert_eq!(
            patterns.suspicious_circuits[0],
            vec!["512100", "512200", "512300", "512100"]
        );
    }

    #[test]
    fn test_transfers_are_capped() {
        let entries: Vec<Entry> = (0..30)
            .map(|_| labelled("Virement interne", "512000", "10"))
            .collect();

        let patterns = detect_suspicious_patterns(&entries);

        assert_eq!(patterns.transfers.len(), 20);
        assert!(patterns.suspicious_circuits.is_empty());
    }
}

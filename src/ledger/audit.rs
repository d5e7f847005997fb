//! Integrity scan over persisted entries

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// A transaction whose entries do not sum to zero
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImbalancedTransaction {
    pub transaction_id: String,
    pub sum: i128,
}

/// Report on ledger integrity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub transactions_checked: usize,
    /// Offending transactions, ordered by id
    pub imbalanced: Vec<ImbalancedTransaction>,
    pub is_balanced: bool,
}

/// Group `(transaction_id, base_amount)` rows by transaction and report every
/// group whose base amounts do not sum to zero
pub fn audit_entry_sums<I, S>(rows: I) -> AuditReport
where
    I: IntoIterator<Item = (S, i64)>,
    S: Into<String>,
{
    let mut sums: BTreeMap<String, i128> = BTreeMap::new();
    for (transaction_id, base_amount) in rows {
        *sums.entry(transaction_id.into()).or_default() += i128::from(base_amount);
    }

    let imbalanced: Vec<ImbalancedTransaction> = sums
        .iter()
        .filter(|(_, sum)| **sum != 0)
        .map(|(transaction_id, sum)| ImbalancedTransaction {
            transaction_id: transaction_id.clone(),
            sum: *sum,
        })
        .collect();

    if !imbalanced.is_empty() {
        warn!(
            count = imbalanced.len(),
            checked = sums.len(),
            "audit found imbalanced transactions"
        );
    }

    AuditReport {
        transactions_checked: sums.len(),
        is_balanced: imbalanced.is_empty(),
        imbalanced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_books() {
        let report = audit_entry_sums(vec![
            ("t1", 5000),
            ("t1", -5000),
            ("t2", 135000),
            ("t2", -135000),
        ]);
        assert!(report.is_balanced);
        assert_eq!(report.transactions_checked, 2);
        assert!(report.imbalanced.is_empty());
    }

    #[test]
    fn test_reports_only_imbalanced_groups() {
        let report = audit_entry_sums(vec![
            ("t3", 100),
            ("t1", 5000),
            ("t3", -50),
            ("t1", -5000),
            ("t2", -7),
        ]);
        assert!(!report.is_balanced);
        assert_eq!(report.transactions_checked, 3);
        assert_eq!(
            report.imbalanced,
            vec![
                ImbalancedTransaction {
                    transaction_id: "t2".to_string(),
                    sum: -7,
                },
                ImbalancedTransaction {
                    transaction_id: "t3".to_string(),
                    sum: 50,
                },
            ]
        );
    }

    #[test]
    fn test_empty_ledger_is_balanced() {
        let report = audit_entry_sums(Vec::<(String, i64)>::new());
        assert!(report.is_balanced);
        assert_eq!(report.transactions_checked, 0);
    }
}

//! Balance validation: the gate every entry set passes before persistence

use tracing::warn;

use crate::types::*;

/// Check that an entry set is well-formed and balanced.
///
/// Rules, first failure wins:
/// 1. at least two entries
/// 2. every entry has exactly one of account or category
/// 3. base amounts sum to exactly zero
///
/// The sum is always reported, whichever rule fails.
pub fn validate_balanced_entries(entries: &[EntryRecord]) -> BalanceCheck {
    let sum: i128 = entries.iter().map(|e| i128::from(e.base_amount)).sum();

    if entries.len() < 2 {
        return rejected(
            sum,
            BalanceViolation::TooFewEntries,
            format!(
                "Transaction must have at least 2 entries, got {}",
                entries.len()
            ),
        );
    }

    if let Some(position) = entries.iter().position(|e| !e.has_single_target()) {
        return rejected(
            sum,
            BalanceViolation::TargetMismatch,
            format!(
                "Each entry must have exactly one of account_id or category_id (entry {position})"
            ),
        );
    }

    if sum != 0 {
        return rejected(
            sum,
            BalanceViolation::NonZeroSum,
            format!("Entries do not sum to zero (sum = {sum})"),
        );
    }

    BalanceCheck {
        valid: true,
        sum,
        error: None,
        violation: None,
    }
}

/// Validate entries produced by the construction recipes
pub fn validate_entries(entries: &[Entry]) -> BalanceCheck {
    let records: Vec<EntryRecord> = entries.iter().map(EntryRecord::from).collect();
    validate_balanced_entries(&records)
}

fn rejected(sum: i128, violation: BalanceViolation, error: String) -> BalanceCheck {
    warn!(?violation, sum, "entry set rejected: {error}");
    BalanceCheck {
        valid: false,
        sum,
        error: Some(error),
        violation: Some(violation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: &str, base_amount: i64) -> EntryRecord {
        EntryRecord {
            account_id: Some(id.to_string()),
            category_id: None,
            amount: base_amount,
            currency: "SGD".to_string(),
            base_amount,
            exchange_rate: None,
        }
    }

    fn category(id: &str, base_amount: i64) -> EntryRecord {
        EntryRecord {
            account_id: None,
            category_id: Some(id.to_string()),
            amount: base_amount,
            currency: "SGD".to_string(),
            base_amount,
            exchange_rate: None,
        }
    }

    #[test]
    fn test_balanced_entries_are_valid() {
        let result = validate_balanced_entries(&[account("a", 100), category("c", -100)]);
        assert!(result.valid);
        assert_eq!(result.sum, 0);
        assert!(result.error.is_none());
        assert_eq!(result.into_result(2).unwrap(), 0);
    }

    #[test]
    fn test_imbalanced_entries_report_sum() {
        let result = validate_balanced_entries(&[account("a", 100), category("c", -50)]);
        assert!(!result.valid);
        assert_eq!(result.sum, 50);
        assert!(result.error.as_deref().unwrap().contains("50"));
        assert!(matches!(
            result.into_result(2),
            Err(LedgerError::Unbalanced { sum: 50 })
        ));
    }

    #[test]
    fn test_fewer_than_two_entries() {
        let result = validate_balanced_entries(&[account("a", 100)]);
        assert!(!result.valid);
        assert_eq!(result.sum, 100);
        assert!(result.error.as_deref().unwrap().contains("at least 2"));
        assert_eq!(result.violation, Some(BalanceViolation::TooFewEntries));

        let empty = validate_balanced_entries(&[]);
        assert!(!empty.valid);
        assert_eq!(empty.sum, 0);
        assert!(matches!(
            empty.into_result(0),
            Err(LedgerError::InsufficientEntries(0))
        ));
    }

    #[test]
    fn test_entry_with_both_targets() {
        let mut both = account("a", 100);
        both.category_id = Some("c".to_string());
        let result = validate_balanced_entries(&[both, account("b", -100)]);
        assert!(!result.valid);
        assert!(result.error.as_deref().unwrap().contains("exactly one"));
        assert_eq!(result.violation, Some(BalanceViolation::TargetMismatch));
    }

    #[test]
    fn test_entry_with_neither_target() {
        let mut neither = account("a", 100);
        neither.account_id = None;
        let result = validate_balanced_entries(&[neither, account("b", -100)]);
        assert!(!result.valid);
        assert!(result.error.as_deref().unwrap().contains("exactly one"));
    }

    #[test]
    fn test_target_check_runs_before_sum_check() {
        let mut neither = account("a", 100);
        neither.account_id = None;
        let result = validate_balanced_entries(&[neither, account("b", -40)]);
        assert_eq!(result.violation, Some(BalanceViolation::TargetMismatch));
        assert_eq!(result.sum, 60);
    }

    #[test]
    fn test_empty_ids_count_as_missing() {
        let mut blank = account("", 100);
        blank.category_id = Some(String::new());
        let result = validate_balanced_entries(&[blank, account("b", -100)]);
        assert!(result.error.as_deref().unwrap().contains("exactly one"));
    }

    #[test]
    fn test_sum_does_not_overflow() {
        let result = validate_balanced_entries(&[
            account("a", i64::MAX),
            account("b", i64::MAX),
            category("c", i64::MIN),
        ]);
        assert!(!result.valid);
        assert_eq!(result.sum, i128::from(i64::MAX) - 1);
    }

    #[test]
    fn test_multi_leg_entries() {
        let result = validate_balanced_entries(&[
            category("groceries", 3000),
            category("household", 2000),
            account("checking", -5000),
        ]);
        assert!(result.valid);
    }

    #[test]
    fn test_result_serializes_like_plain_data() {
        let result = validate_balanced_entries(&[account("a", 100), category("c", -50)]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["sum"], 50);
        assert_eq!(json["violation"], "non_zero_sum");
    }
}

use std::collections::HashMap;

use regex::Regex;

use crate::error::{MigrateError, Result};
use crate::models::AccountType;

/// Types that win outright when they are the first keyword found in a path.
const TOP_LEVEL_TYPES: [AccountType; 2] = [AccountType::Income, AccountType::Expense];

pub type KeywordTable = HashMap<AccountType, Vec<String>>;

pub fn default_keywords() -> KeywordTable {
    let table: &[(AccountType, &[&str])] = &[
        (AccountType::Asset, &["ASSET", "ASSETS"]),
        (AccountType::Liability, &["LIABILITY", "LIABILITIES"]),
        (AccountType::Equity, &["EQUITY", "EQUITIES"]),
        (AccountType::Income, &["INCOME", "INCOMES"]),
        (AccountType::Expense, &["EXPENSE", "EXPENSES", "ADJUSTMENT"]),
        (AccountType::Cash, &["CASH"]),
        (AccountType::Bank, &["CHECKING", "ACCOUNT"]),
        (AccountType::Credit, &["CREDIT CARD", "CREDIT CARDS"]),
        (AccountType::Payable, &["ACCOUNTS PAYABLE", "PAYABLE"]),
        (AccountType::Receivable, &["ACCOUNTS RECEIVABLE", "RECEIVABLES"]),
        (AccountType::Stock, &["BROKERAGE"]),
        (AccountType::Mutual, &["MUTUAL FUND", "MONEY MARKET FUND", "FUND"]),
        (AccountType::Trading, &["OTHER"]),
    ];
    table
        .iter()
        .map(|(t, words)| (*t, words.iter().map(|w| w.to_string()).collect()))
        .collect()
}

/// Guesses GnuCash account types from the words in a full account path.
pub struct Classifier {
    pattern: Regex,
    types: HashMap<String, AccountType>,
}

impl Classifier {
    pub fn new(table: &KeywordTable) -> Result<Self> {
        let mut types = HashMap::new();
        for (account_type, words) in table {
            for word in words {
                let key = word.trim().to_uppercase();
                if key.is_empty() {
                    continue;
                }
                if let Some(previous) = types.insert(key.clone(), *account_type) {
                    if previous != *account_type {
                        return Err(MigrateError::Settings(format!(
                            "keyword '{key}' is listed for both {previous} and {account_type}"
                        )));
                    }
                }
            }
        }
        if types.is_empty() {
            return Err(MigrateError::Settings("account keyword table is empty".to_string()));
        }

        // Longest first, so "ACCOUNTS PAYABLE" is not swallowed by "ACCOUNT".
        let mut keywords: Vec<&String> = types.keys().collect();
        keywords.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let alternation = keywords
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!("(?i){alternation}"))
            .map_err(|e| MigrateError::Settings(format!("invalid account keyword: {e}")))?;

        Ok(Self { pattern, types })
    }

    /// Types implied by each keyword found in `path`, in the order they appear.
    pub fn candidate_types(&self, path: &str) -> Vec<AccountType> {
        let upper = path.to_uppercase();
        self.pattern
            .find_iter(&upper)
            .filter_map(|m| self.types.get(m.as_str()).copied())
            .collect()
    }

    pub fn classify(&self, path: &str, placeholder: bool) -> Result<AccountType> {
        chosen_type(&self.candidate_types(path), placeholder)
            .ok_or_else(|| MigrateError::UnclassifiedAccount(path.to_string()))
    }
}

impl Default for Classifier {
    fn default() -> Self {
        match Self::new(&default_keywords()) {
            Ok(classifier) => classifier,
            Err(e) => unreachable!("built-in keyword table is valid: {e}"),
        }
    }
}

/// Picks one type from the ordered keyword hits.
///
/// Paths run from general to specific. A leaf takes the last (most specific)
/// hit; a placeholder takes the second-to-last so a "Cash" parent of several
/// accounts is not typed like one of its children. Income and expense trees
/// keep their top-level type regardless.
pub fn chosen_type(candidates: &[AccountType], placeholder: bool) -> Option<AccountType> {
    let first = *candidates.first()?;
    if TOP_LEVEL_TYPES.contains(&first) {
        return Some(first);
    }
    let n = candidates.len();
    let index = if placeholder {
        if n > 1 {
            n - 2
        } else {
            0
        }
    } else {
        n - 1
    };
    Some(candidates[index])
}

#[cfg(test)]
mod tests {
    use super::*;
    use AccountType::*;

    fn classify(path: &str, placeholder: bool) -> AccountType {
        Classifier::default().classify(path, placeholder).unwrap()
    }

    #[test]
    fn test_candidates_in_path_order() {
        let c = Classifier::default();
        assert_eq!(c.candidate_types("Assets:Cash:Checking"), vec![Asset, Cash, Bank]);
        assert_eq!(c.candidate_types("assets:current assets"), vec![Asset, Asset]);
    }

    #[test]
    fn test_longest_keyword_wins() {
        let c = Classifier::default();
        assert_eq!(c.candidate_types("Liabilities:Accounts Payable"), vec![Liability, Payable]);
        assert_eq!(c.candidate_types("Assets:Mutual Fund"), vec![Asset, Mutual]);
        assert_eq!(c.candidate_types("Liabilities:Credit Cards:Visa"), vec![Liability, Credit]);
    }

    #[test]
    fn test_leaf_takes_last_match() {
        assert_eq!(classify("Assets:Current Assets:Checking", false), Bank);
        assert_eq!(classify("Assets:Cash:Cash", false), Cash);
        assert_eq!(classify("Assets:Investments:Brokerage", false), Stock);
    }

    #[test]
    fn test_placeholder_takes_second_to_last() {
        assert_eq!(classify("Assets:Current Assets", true), Asset);
        assert_eq!(classify("Assets:Cash", true), Asset);
        assert_eq!(classify("Assets", true), Asset);
    }

    #[test]
    fn test_income_and_expense_win_when_first() {
        assert_eq!(classify("Expenses:Other Expense:Membership & Dues", false), Expense);
        assert_eq!(classify("Income:Interest:Checking Account", false), Income);
        assert_eq!(classify("Expenses:Cash Withdrawal", true), Expense);
    }

    #[test]
    fn test_no_keyword_is_an_error() {
        let err = Classifier::default().classify("Property:2012 Silverado", false).unwrap_err();
        assert!(matches!(err, MigrateError::UnclassifiedAccount(p) if p == "Property:2012 Silverado"));
    }

    #[test]
    fn test_chosen_type_positions() {
        assert_eq!(chosen_type(&[], false), None);
        assert_eq!(chosen_type(&[Asset], true), Some(Asset));
        assert_eq!(chosen_type(&[Asset, Cash, Bank], true), Some(Cash));
        assert_eq!(chosen_type(&[Asset, Cash, Bank], false), Some(Bank));
        assert_eq!(chosen_type(&[Expense, Cash], false), Some(Expense));
    }

    #[test]
    fn test_classification_is_repeatable() {
        let c = Classifier::default();
        let paths = [("Assets:Cash", true), ("Assets:Cash:Checking", false), ("Liabilities", true)];
        let first: Vec<_> = paths.iter().map(|(p, ph)| c.classify(p, *ph).unwrap()).collect();
        let second: Vec<_> = paths.iter().map(|(p, ph)| c.classify(p, *ph).unwrap()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_table() {
        let mut table = KeywordTable::new();
        table.insert(Asset, vec!["Property".to_string()]);
        table.insert(Stock, vec!["IRA".to_string()]);
        let c = Classifier::new(&table).unwrap();
        assert_eq!(c.classify("Property:IRA", false).unwrap(), Stock);
    }

    #[test]
    fn test_duplicate_keyword_rejected() {
        let mut table = KeywordTable::new();
        table.insert(Asset, vec!["CASH".to_string()]);
        table.insert(Cash, vec!["cash".to_string()]);
        assert!(Classifier::new(&table).is_err());
    }
}

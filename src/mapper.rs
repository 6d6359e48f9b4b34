use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};

use crate::account_names::{name_of, parent_of};
use crate::models::{
    AccountToMove, AccountType, PreparedAccount, PreparedTransaction, SplitToMove, TransactionToMove,
};
use crate::settings::Settings;
use crate::utils::hierarchy_from;

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// One account per prepared row. A new book also gets the equity accounts
/// that opening balances are drawn from, appended after the rows.
pub fn mapped_accounts(prepared: &[PreparedAccount], new_book: bool, settings: &Settings) -> Vec<AccountToMove> {
    let mut accounts: Vec<AccountToMove> = prepared
        .iter()
        .map(|p| AccountToMove {
            name: p.name.clone(),
            account_type: p.account_type,
            parent: p.parent.clone(),
            commodity: p.commodity.clone(),
            placeholder: p.placeholder,
            description: p.description.clone(),
        })
        .collect();

    if new_book {
        for (path, height) in hierarchy_from(&settings.opening_balances_account) {
            accounts.push(AccountToMove {
                name: name_of(&path).to_string(),
                account_type: AccountType::Equity,
                parent: parent_of(&path),
                commodity: settings.currency.clone(),
                placeholder: height > 0,
                description: String::new(),
            });
        }
    }
    accounts
}

/// Opening balance rows carried by prepared accounts, in account order.
pub fn opening_transactions(prepared: &[PreparedAccount]) -> Vec<PreparedTransaction> {
    prepared.iter().filter_map(|p| p.opening.clone()).collect()
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

fn split_pair(row: &PreparedTransaction) -> [SplitToMove; 2] {
    [
        SplitToMove {
            account: row.acct_from.clone(),
            value: -row.amount,
            memo: row.memo.clone(),
        },
        SplitToMove {
            account: row.acct_to.clone(),
            value: row.amount,
            memo: row.memo.clone(),
        },
    ]
}

fn transaction_from(
    lead: &PreparedTransaction,
    splits: Vec<SplitToMove>,
    enter_date: NaiveDateTime,
    currency: &str,
) -> TransactionToMove {
    TransactionToMove {
        post_date: lead.date,
        enter_date,
        currency: currency.to_string(),
        description: lead.description.clone(),
        notes: lead.memo.clone(),
        num: lead.num.clone(),
        splits,
    }
}

/// Builds balanced transactions from prepared rows.
///
/// Rows marked as splits are grouped by date and description, keeping the
/// order groups were first seen, and each group becomes one transaction whose
/// date, notes and number come from its first row. Every other row is its own
/// two-split transaction. Grouped transactions come first.
pub fn mapped_transactions(
    rows: &[PreparedTransaction],
    enter_date: NaiveDateTime,
    currency: &str,
) -> Vec<TransactionToMove> {
    let mut groups: Vec<Vec<&PreparedTransaction>> = Vec::new();
    let mut group_index: HashMap<(NaiveDate, &str), usize> = HashMap::new();
    let mut singles = Vec::new();

    for row in rows {
        if !row.split {
            singles.push(row);
            continue;
        }
        let key = (row.date, row.description.as_str());
        match group_index.get(&key) {
            Some(&i) => groups[i].push(row),
            None => {
                group_index.insert(key, groups.len());
                groups.push(vec![row]);
            }
        }
    }

    let multi = groups.into_iter().map(|group| {
        let splits = group.iter().flat_map(|r| split_pair(r)).collect();
        transaction_from(group[0], splits, enter_date, currency)
    });
    let single = singles
        .into_iter()
        .map(|row| transaction_from(row, split_pair(row).to_vec(), enter_date, currency));

    multi.chain(single).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountsReport, Parent, RawAccountRow};
    use crate::preparation::prepared_balances;
    use rust_decimal::Decimal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn now() -> NaiveDateTime {
        date(2023, 2, 1).and_hms_opt(12, 0, 0).unwrap()
    }

    fn txn(split: bool, day: u32, description: &str, to: &str, cents: i64) -> PreparedTransaction {
        PreparedTransaction {
            split,
            date: date(2017, 1, day),
            description: description.to_string(),
            acct_from: "Assets:Checking".to_string(),
            acct_to: to.to_string(),
            amount: Decimal::new(cents, 2),
            memo: format!("memo {to}"),
            num: format!("{description}-{to}"),
        }
    }

    fn account(path: &str, placeholder: bool, account_type: AccountType) -> PreparedAccount {
        PreparedAccount {
            path_and_name: path.to_string(),
            name: name_of(path).to_string(),
            parent: parent_of(path),
            placeholder,
            account_type,
            commodity: "USD".to_string(),
            description: "Migrated by Move2GnuCash".to_string(),
            opening: None,
        }
    }

    #[test]
    fn test_mapped_accounts_for_new_book() {
        let prepared = vec![
            account("Assets", true, AccountType::Asset),
            account("Assets:Checking", false, AccountType::Bank),
            account("Liabilities", true, AccountType::Liability),
        ];
        let accounts = mapped_accounts(&prepared, true, &Settings::default());
        assert_eq!(accounts.len(), 5);
        assert_eq!(accounts[1].name, "Checking");
        assert_eq!(accounts[1].parent, Parent::Path("Assets".to_string()));
        assert_eq!(accounts[1].description, "Migrated by Move2GnuCash");

        let equity = &accounts[3];
        assert_eq!(equity.name, "Equity");
        assert_eq!(equity.account_type, AccountType::Equity);
        assert_eq!(equity.parent, Parent::Root);
        assert!(equity.placeholder);
        assert_eq!(equity.description, "");

        let opening = &accounts[4];
        assert_eq!(opening.name, "Opening Balances");
        assert_eq!(opening.parent, Parent::Path("Equity".to_string()));
        assert!(!opening.placeholder);
    }

    #[test]
    fn test_mapped_accounts_for_existing_book() {
        let prepared = vec![account("Income", true, AccountType::Income)];
        assert_eq!(mapped_accounts(&prepared, false, &Settings::default()).len(), 1);
    }

    #[test]
    fn test_single_row_pair() {
        let rows = vec![txn(false, 3, "Target", "Expenses:Groceries", 814)];
        let txns = mapped_transactions(&rows, now(), "USD");
        assert_eq!(txns.len(), 1);
        let t = &txns[0];
        assert_eq!(t.splits.len(), 2);
        assert_eq!(t.splits[0].account, "Assets:Checking");
        assert_eq!(t.splits[0].value, Decimal::new(-814, 2));
        assert_eq!(t.splits[1].account, "Expenses:Groceries");
        assert_eq!(t.splits[1].value, Decimal::new(814, 2));
        assert_eq!(t.splits[0].memo, "memo Expenses:Groceries");
        assert_eq!(t.notes, "memo Expenses:Groceries");
        assert_eq!(t.enter_date, now());
        assert_eq!(t.currency, "USD");
        assert!(t.is_balanced());
    }

    #[test]
    fn test_opening_balance_legs() {
        let mut checking = account("Assets:Checking", false, AccountType::Bank);
        checking.opening = Some(PreparedTransaction {
            split: false,
            date: date(2016, 12, 31),
            description: "Opening Balance".to_string(),
            acct_from: "Assets:Checking".to_string(),
            acct_to: "Equity:Opening Balances".to_string(),
            amount: Decimal::new(-100_000, 2),
            memo: String::new(),
            num: "1".to_string(),
        });
        let rows = opening_transactions(&[account("Assets", true, AccountType::Asset), checking]);
        let txns = mapped_transactions(&rows, now(), "USD");
        assert_eq!(txns[0].splits[0].account, "Assets:Checking");
        assert_eq!(txns[0].splits[0].value, Decimal::new(100_000, 2));
        assert_eq!(txns[0].splits[1].value, Decimal::new(-100_000, 2));
    }

    #[test]
    fn test_net_worth_report_into_a_new_book() {
        fn row(root: Option<&str>, account: Option<&str>, balance: Option<i64>) -> RawAccountRow {
            RawAccountRow {
                root: root.map(String::from),
                account: account.map(String::from),
                balance: balance.map(|b| Decimal::new(b, 2)),
            }
        }
        let report = AccountsReport {
            as_of_date: date(2016, 12, 31),
            rows: vec![
                row(Some("Assets"), None, None),
                row(None, Some("Current Assets"), None),
                row(None, Some(" - Checking"), Some(100_000)),
            ],
        };
        let settings = Settings::default();
        let prepared = prepared_balances(&report, &settings).unwrap();

        let accounts = mapped_accounts(&prepared, true, &settings);
        let names: Vec<_> = accounts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Assets", "Current Assets", "Checking", "Equity", "Opening Balances"]);

        let txns = mapped_transactions(&opening_transactions(&prepared), now(), "USD");
        assert_eq!(txns.len(), 1);
        let legs: Vec<_> = txns[0].splits.iter().map(|s| (s.account.as_str(), s.value)).collect();
        assert_eq!(
            legs,
            [
                ("Assets:Current Assets:Checking", Decimal::new(100_000, 2)),
                ("Equity:Opening Balances", Decimal::new(-100_000, 2)),
            ]
        );
        assert_eq!(txns[0].post_date, date(2016, 12, 31));
    }

    #[test]
    fn test_multi_split_groups() {
        let rows = vec![
            txn(false, 2, "Coffee", "Expenses:Dining", 300),
            txn(true, 3, "Target", "Expenses:Groceries", 814),
            txn(true, 4, "Costco", "Expenses:Groceries", 5000),
            txn(true, 3, "Target", "Expenses:Household", 1200),
            txn(true, 3, "Target", "Expenses:Clothing", 2500),
            txn(true, 4, "Costco", "Expenses:Gas", 4000),
            txn(false, 5, "Salary", "Income:Salary", -200_000),
        ];
        let txns = mapped_transactions(&rows, now(), "USD");
        assert_eq!(txns.len(), 4);

        assert_eq!(txns[0].description, "Target");
        assert_eq!(txns[0].splits.len(), 6);
        assert_eq!(txns[0].num, "Target-Expenses:Groceries");
        assert_eq!(txns[0].notes, "memo Expenses:Groceries");
        assert_eq!(txns[0].post_date, date(2017, 1, 3));

        assert_eq!(txns[1].description, "Costco");
        assert_eq!(txns[1].splits.len(), 4);

        assert_eq!(txns[2].description, "Coffee");
        assert_eq!(txns[3].description, "Salary");
        assert!(txns.iter().all(|t| t.is_balanced()));
    }

    #[test]
    fn test_same_description_different_date_is_separate_group() {
        let rows = vec![
            txn(true, 3, "Target", "Expenses:Groceries", 100),
            txn(true, 4, "Target", "Expenses:Groceries", 200),
        ];
        let txns = mapped_transactions(&rows, now(), "USD");
        assert_eq!(txns.len(), 2);
        assert!(txns.iter().all(|t| t.splits.len() == 2));
    }

    #[test]
    fn test_empty_input() {
        assert!(mapped_transactions(&[], now(), "USD").is_empty());
    }
}

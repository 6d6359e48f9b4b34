use crate::models::{NamedAccount, Parent, RawAccountRow};
use crate::utils::{custom_join, ACCOUNT_SEPARATOR};

/// Separator Quicken uses between hierarchy levels inside a single report cell.
const LEVEL_SEPARATOR: &str = " - ";

/// Marker of Quicken's subtotal lines, which are not real accounts.
const TOTAL_MARKER: &str = ":Total";

pub fn parent_of(path: &str) -> Parent {
    match path.rsplit_once(ACCOUNT_SEPARATOR) {
        Some((parent, _)) => Parent::Path(parent.to_string()),
        None => Parent::Root,
    }
}

pub fn name_of(path: &str) -> &str {
    match path.rsplit_once(ACCOUNT_SEPARATOR) {
        Some((_, name)) => name,
        None => path,
    }
}

/// Expands a Quicken report into fully qualified account paths.
///
/// The root column is only filled on header rows and carries forward to the
/// rows below it. A sub-account cell may hold several levels joined with
/// `" - "`; a blank level takes the last value seen at that depth. Subtotal
/// rows are dropped.
pub fn reconstruct_paths(rows: &[RawAccountRow]) -> Vec<NamedAccount> {
    let mut root: Option<String> = None;
    let mut last_at_depth: Vec<String> = Vec::new();
    let mut named = Vec::new();

    for row in rows {
        if let Some(r) = non_blank(row.root.as_deref()) {
            root = Some(r.to_string());
        }

        let levels: Vec<&str> = match non_blank(row.account.as_deref()) {
            Some(fragment) => fragment.split(LEVEL_SEPARATOR).map(str::trim).collect(),
            None => Vec::new(),
        };

        let mut resolved = Vec::with_capacity(levels.len());
        for (depth, level) in levels.iter().enumerate() {
            let value = if level.is_empty() {
                last_at_depth.get(depth).cloned().unwrap_or_default()
            } else {
                level.to_string()
            };
            if depth < last_at_depth.len() {
                last_at_depth[depth] = value.clone();
            } else {
                last_at_depth.push(value.clone());
            }
            resolved.push(value);
        }
        // Deeper levels were absent on this row, so they must not leak into later rows.
        last_at_depth.truncate(levels.len());

        let Some(root) = root.as_deref() else {
            log::warn!("Skipping report row without a root account: {row:?}");
            continue;
        };
        let path_and_name = format!("{root}{}", custom_join(&resolved));
        if path_and_name.contains(TOTAL_MARKER) {
            log::debug!("Dropping subtotal row {path_and_name}");
            continue;
        }
        named.push(NamedAccount {
            path_and_name,
            balance: row.balance,
        });
    }
    named
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn row(root: Option<&str>, account: Option<&str>, balance: Option<i64>) -> RawAccountRow {
        RawAccountRow {
            root: root.map(String::from),
            account: account.map(String::from),
            balance: balance.map(|b| Decimal::new(b, 2)),
        }
    }

    fn paths(rows: &[RawAccountRow]) -> Vec<String> {
        reconstruct_paths(rows)
            .into_iter()
            .map(|n| n.path_and_name)
            .collect()
    }

    #[test]
    fn test_parent_of() {
        assert_eq!(parent_of("Assets:Current Assets:Checking"), Parent::Path("Assets:Current Assets".to_string()));
        assert_eq!(parent_of("Assets"), Parent::Root);
    }

    #[test]
    fn test_name_of() {
        assert_eq!(name_of("Assets:Current Assets:Checking"), "Checking");
        assert_eq!(name_of("Assets"), "Assets");
    }

    #[test]
    fn test_parent_and_name_compose_back_to_path() {
        for path in ["A:B", "Assets:Current Assets:Checking", "Expenses:Food:Dining:Out"] {
            let Parent::Path(parent) = parent_of(path) else {
                panic!("{path} should have a parent");
            };
            assert_eq!(format!("{parent}:{}", name_of(path)), path);
        }
    }

    #[test]
    fn test_root_rows_and_forward_filled_root() {
        let rows = vec![
            row(Some("Assets"), None, None),
            row(None, Some("Cash"), None),
            row(None, Some(" - Checking"), Some(100_000)),
            row(Some("Liabilities"), None, None),
            row(None, Some("Credit Cards"), None),
        ];
        assert_eq!(
            paths(&rows),
            vec![
                "Assets",
                "Assets:Cash",
                "Assets:Cash:Checking",
                "Liabilities",
                "Liabilities:Credit Cards",
            ]
        );
    }

    #[test]
    fn test_blank_level_carries_last_seen_fragment() {
        let rows = vec![
            row(Some("Assets"), None, None),
            row(None, Some("Savings"), None),
            row(None, Some(" - Spouse Savings"), Some(98_712)),
            row(None, Some(" - Savings Account"), Some(325_000)),
            row(None, Some("Property - 2012 Silverado"), Some(3_097_500)),
        ];
        assert_eq!(
            paths(&rows),
            vec![
                "Assets",
                "Assets:Savings",
                "Assets:Savings:Spouse Savings",
                "Assets:Savings:Savings Account",
                "Assets:Property:2012 Silverado",
            ]
        );
    }

    #[test]
    fn test_absent_deeper_level_does_not_leak() {
        let rows = vec![
            row(Some("Expenses"), None, None),
            row(None, Some("Auto - Fuel - Premium"), Some(100)),
            row(None, Some("Food"), None),
            row(None, Some(" - Groceries"), Some(200)),
        ];
        assert_eq!(
            paths(&rows),
            vec![
                "Expenses",
                "Expenses:Auto:Fuel:Premium",
                "Expenses:Food",
                "Expenses:Food:Groceries",
            ]
        );
    }

    #[test]
    fn test_total_rows_are_dropped() {
        let rows = vec![
            row(Some("Assets"), None, None),
            row(None, Some("Cash"), None),
            row(None, Some(" - Checking"), Some(44_084)),
            row(None, Some(" - Total Cash"), Some(44_084)),
            row(None, Some("Total Assets"), Some(44_084)),
        ];
        assert_eq!(paths(&rows), vec!["Assets", "Assets:Cash", "Assets:Cash:Checking"]);
    }

    #[test]
    fn test_balance_is_carried() {
        let rows = vec![
            row(Some("Assets"), None, None),
            row(None, Some("Checking"), Some(100_000)),
        ];
        let named = reconstruct_paths(&rows);
        assert_eq!(named[0].balance, None);
        assert_eq!(named[1].balance, Some(Decimal::new(100_000, 2)));
    }
}

use rust_decimal::Decimal;

pub const ACCOUNT_SEPARATOR: char = ':';

/// Joins two optional pieces of text, e.g. a memo and its tags.
pub fn combined_strings_by(first: &str, second: &str, separator: &str) -> String {
    match (first.is_empty(), second.is_empty()) {
        (true, _) => second.to_string(),
        (_, true) => first.to_string(),
        _ => format!("{first}{separator} {second}"),
    }
}

/// Joins the non-empty parts, each preceded by a colon: `["Foo", "Bar", ""]` -> `":Foo:Bar"`.
pub fn custom_join<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(AsRef::as_ref)
        .filter(|p| !p.is_empty())
        .fold(String::new(), |mut acc, p| {
            acc.push(ACCOUNT_SEPARATOR);
            acc.push_str(p);
            acc
        })
}

/// Keeps the first `keep` delimited parts of `s`, or all but the last when `keep` is `None`.
pub fn string_trimmed_after(s: &str, delimiter: &str, keep: Option<usize>) -> String {
    let parts: Vec<&str> = s.split(delimiter).collect();
    let keep = keep.unwrap_or(parts.len().saturating_sub(1)).min(parts.len());
    parts[..keep].join(delimiter)
}

/// Drops the first `drop` delimited parts of `s`, or all but the last when `drop` is `None`.
pub fn string_trimmed_before(s: &str, delimiter: &str, drop: Option<usize>) -> String {
    let parts: Vec<&str> = s.split(delimiter).collect();
    let drop = drop.unwrap_or(parts.len().saturating_sub(1)).min(parts.len());
    parts[drop..].join(delimiter)
}

/// Every ancestor path of `path` (including itself) with its height above the leaf.
pub fn hierarchy_from(path: &str) -> Vec<(String, usize)> {
    let parts: Vec<&str> = path.split(ACCOUNT_SEPARATOR).collect();
    let depth = parts.len();
    (1..=depth)
        .map(|n| (parts[..n].join(":"), depth - n))
        .collect()
}

/// Rounds to `places` fractional digits and pins the scale, so `10.03` at 4 places prints `10.0300`.
pub fn decimal_to(value: Decimal, places: u32) -> Decimal {
    let mut rounded = value.round_dp(places);
    rounded.rescale(places);
    rounded
}

/// Names in `existing` whose trailing colon segments are exactly the segments of `candidate`.
///
/// `"Food:Dining"` matches `"Expenses:Food:Dining"`, while `"Food"` does not, because
/// the leaf of that account is `Dining`.
pub fn full_string_right_match(existing: &[String], candidate: &str) -> Vec<String> {
    let wanted: Vec<&str> = candidate.split(ACCOUNT_SEPARATOR).collect();
    existing
        .iter()
        .filter(|name| {
            let segments: Vec<&str> = name.split(ACCOUNT_SEPARATOR).collect();
            segments.ends_with(&wanted)
        })
        .cloned()
        .collect()
}

use rust_decimal::Decimal;

use crate::utils::decimal_to;

/// Formats an amount in the book's currency with thousands separators: `1,234.56 USD`.
pub fn money(val: Decimal, currency: &str) -> String {
    let rounded = decimal_to(val.abs(), 2).to_string();
    let (int_part, dec_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    let sign = if val.is_sign_negative() && !val.is_zero() { "-" } else { "" };
    format!("{sign}{with_commas}.{dec_part} {currency}")
}

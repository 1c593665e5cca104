use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::DisplayConfig;

/// Thousands separators for the integer digits: "1234567" → "1,234,567".
fn group_thousands(digits: &str) -> String {
    let lead = digits.len() % 3;
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.char_indices() {
        if i > 0 && (i + 3 - lead) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Render a non-negative decimal, optionally with exactly `fixed_dp`
/// fraction digits and grouped thousands.
fn render_digits(value: Decimal, fixed_dp: Option<u32>, grouping: bool) -> String {
    let text = value.normalize().to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));

    let frac = match fixed_dp {
        Some(dp) => {
            let dp = dp as usize;
            let mut frac: String = frac_part.chars().take(dp).collect();
            frac.extend(std::iter::repeat('0').take(dp - frac.len()));
            frac
        }
        None => frac_part.to_string(),
    };

    let int = if grouping {
        group_thousands(int_part)
    } else {
        int_part.to_string()
    };

    if frac.is_empty() {
        int
    } else {
        format!("{int}.{frac}")
    }
}

/// Format a currency value for the report.
///
/// Options come from `[display]`:
/// - `currency_decimals`: rounding precision (half away from zero)
/// - `currency_grouping`: enable thousands separators (`,`)
/// - `currency_symbol`: optional prefix (e.g. `$`)
/// - `currency_fixed_decimals`: when true and `currency_decimals` is set,
///   pad/truncate to exactly that many decimal places
pub fn format_currency(value: Decimal, display: &DisplayConfig) -> String {
    let rounded = match display.currency_decimals {
        Some(dp) => value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero),
        None => value,
    };

    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let fixed_dp = display
        .currency_decimals
        .filter(|_| display.currency_fixed_decimals);
    let digits = render_digits(rounded.abs(), fixed_dp, display.currency_grouping);

    format!(
        "{}{}{digits}",
        if negative { "-" } else { "" },
        display.currency_symbol.as_deref().unwrap_or("")
    )
}

/// Canonical string for a quantity: trailing zeros stripped.
pub fn format_amount(value: Decimal) -> String {
    value.normalize().to_string()
}

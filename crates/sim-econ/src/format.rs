use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

const SUFFIXES: [&str; 12] = ["", "k", "M", "B", "T", "q", "Q", "s", "S", "O", "N", "d"];

/// Format a balance for display.
///
/// Amounts under 1000 print with cents; larger amounts print three
/// significant digits with a thousands suffix.
///
/// Example:
/// assert_eq!(format_money(12.5), "$12.50");
/// assert_eq!(format_money(1_234_567.0), "$1.23M");
pub fn format_money(amount: f64) -> String {
    if !amount.is_finite() {
        return "$--".to_string();
    }
    if amount < 1000.0 {
        return format!("${amount:.2}");
    }
    let digits = format!("{:.0}", amount.floor()).len();
    let mut tier = ((digits - 1) / 3).min(SUFFIXES.len() - 1);
    let scaled = amount / 1000f64.powi(tier as i32);
    let mut short = Decimal::from_f64(scaled).and_then(three_digits);
    // rounding may carry into the next tier: 999.999k is $1M
    if let Some(d) = short {
        let thousand = Decimal::from(1000);
        if d >= thousand && tier + 1 < SUFFIXES.len() {
            tier += 1;
            short = three_digits(d / thousand);
        }
    }
    match short {
        Some(d) => format!("${d}{}", SUFFIXES[tier]),
        None => format!("${:.2}{}", amount / 1000f64.powi(tier as i32), SUFFIXES[tier]),
    }
}

fn three_digits(d: Decimal) -> Option<Decimal> {
    d.round_sf(3).map(|d| d.round_dp(2).normalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_amounts_show_cents() {
        assert_eq!(format_money(0.0), "$0.00");
        assert_eq!(format_money(12.5), "$12.50");
        assert_eq!(format_money(999.5), "$999.50");
    }

    #[test]
    fn large_amounts_use_suffixes() {
        assert_eq!(format_money(1_000.0), "$1k");
        assert_eq!(format_money(1_500.0), "$1.5k");
        assert_eq!(format_money(12_300.0), "$12.3k");
        assert_eq!(format_money(250_000.0), "$250k");
        assert_eq!(format_money(1_234_567.0), "$1.23M");
        assert_eq!(format_money(20_000_000.0), "$20M");
    }

    #[test]
    fn rounding_carries_into_next_suffix() {
        assert_eq!(format_money(999_999.0), "$1M");
        assert_eq!(format_money(999_999_999.0), "$1B");
        assert_eq!(format_money(999_400.0), "$999k");
    }

    #[test]
    fn non_finite_is_placeholder() {
        assert_eq!(format_money(f64::NAN), "$--");
    }
}

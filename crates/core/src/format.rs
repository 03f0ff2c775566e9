use rust_decimal::{Decimal, RoundingStrategy};

/// Renders an amount as US currency with thousands separators, e.g. `$1,234.50`.
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let digits = format!("{:.2}", rounded.abs());
    let (whole, cents) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    format!("{sign}${}.{cents}", group_thousands(whole))
}

fn group_thousands(whole: &str) -> String {
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, ch) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::format_currency;

    fn amount(value: &str) -> Decimal {
        Decimal::from_str(value).expect("decimal literal")
    }

    #[test]
    fn formats_with_separators_and_two_places() {
        assert_eq!(format_currency(amount("1234.5")), "$1,234.50");
        assert_eq!(format_currency(Decimal::ZERO), "$0.00");
        assert_eq!(format_currency(amount("150.5")), "$150.50");
        assert_eq!(format_currency(amount("999")), "$999.00");
        assert_eq!(format_currency(amount("1000")), "$1,000.00");
        assert_eq!(format_currency(amount("1234567.891")), "$1,234,567.89");
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(format_currency(amount("0.005")), "$0.01");
        assert_eq!(format_currency(amount("2.675")), "$2.68");
        assert_eq!(format_currency(amount("999.999")), "$1,000.00");
    }

    #[test]
    fn negative_amounts_carry_a_leading_sign() {
        assert_eq!(format_currency(amount("-5")), "-$5.00");
        assert_eq!(format_currency(amount("-1234.5")), "-$1,234.50");
        assert_eq!(format_currency(amount("-0.001")), "$0.00");
    }
}

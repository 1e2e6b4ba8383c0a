use std::str::FromStr;

use chrono::TimeDelta;
use rust_decimal::Decimal;

/// Format a decimal as a dollar amount with thousands separators: $1,234.56
pub fn money(val: Decimal) -> String {
    let negative = val.is_sign_negative() && !val.is_zero();
    let cents = format!("{:.2}", val.abs().round_dp(2));
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-${with_commas}.{dec_part}")
    } else {
        format!("${with_commas}.{dec_part}")
    }
}

/// Money-format a sheet cell, leaving anything non-numeric as is.
pub fn money_cell(raw: &str) -> String {
    Decimal::from_str(raw.trim()).map(money).unwrap_or_else(|_| raw.to_string())
}

/// Short human age: 45m, 3h 10m, 2d 4h.
pub fn age(delta: TimeDelta) -> String {
    let minutes = delta.num_minutes().max(0);
    let (days, hours, mins) = (minutes / 1440, (minutes % 1440) / 60, minutes % 60);
    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(dec!(1234.56)), "$1,234.56");
        assert_eq!(money(dec!(-500.00)), "-$500.00");
        assert_eq!(money(dec!(0)), "$0.00");
        assert_eq!(money(dec!(1000000.99)), "$1,000,000.99");
        assert_eq!(money(dec!(42.1)), "$42.10");
    }

    #[test]
    fn test_money_cell() {
        assert_eq!(money_cell("-12.5"), "-$12.50");
        assert_eq!(money_cell(""), "");
        assert_eq!(money_cell("n/a"), "n/a");
    }

    #[test]
    fn test_age() {
        assert_eq!(age(TimeDelta::minutes(45)), "45m");
        assert_eq!(age(TimeDelta::minutes(190)), "3h 10m");
        assert_eq!(age(TimeDelta::hours(52)), "2d 4h");
        assert_eq!(age(TimeDelta::minutes(-5)), "0m");
    }
}

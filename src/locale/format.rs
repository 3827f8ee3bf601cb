// invoice-design-service/src/locale/format.rs

//! Locale-aware number, money and date formatting.

use super::NumberFormat;
use chrono::NaiveDate;
use std::fmt::Write;
use std::iter::Sum;
use std::ops::{Add, Neg, Sub};

/// An amount in hundredths of a currency unit. Arithmetic saturates at the
/// bounds of `i64` instead of wrapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Round a decimal amount to the nearest cent. Non-finite input is zero.
    pub fn from_decimal(value: f64) -> Self {
        if value.is_finite() {
            Money((value * 100.0).round() as i64)
        } else {
            Money::ZERO
        }
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    /// `rate` percent of this amount, rounded to the nearest cent.
    pub fn percent(self, rate: f64) -> Self {
        Money::from_cents(((self.0 as f64) * rate / 100.0).round() as i64)
    }

    /// Multiply a unit amount by a quantity, rounded to the nearest cent.
    pub fn times(self, quantity: f64) -> Self {
        Money::from_cents(((self.0 as f64) * quantity).round() as i64)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Plain `1204.50` form, independent of locale.
    pub fn to_decimal_string(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(self.0.saturating_neg())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Currency {
    pub code: &'static str,
    pub symbol: &'static str,
    /// Decimal places shown, at most 2.
    pub precision: u32,
}

const CURRENCIES: &[Currency] = &[
    Currency { code: "USD", symbol: "$", precision: 2 },
    Currency { code: "EUR", symbol: "€", precision: 2 },
    Currency { code: "GBP", symbol: "£", precision: 2 },
    Currency { code: "CAD", symbol: "CA$", precision: 2 },
    Currency { code: "AUD", symbol: "A$", precision: 2 },
    Currency { code: "NZD", symbol: "NZ$", precision: 2 },
    Currency { code: "CHF", symbol: "CHF", precision: 2 },
    Currency { code: "SEK", symbol: "kr", precision: 2 },
    Currency { code: "INR", symbol: "₹", precision: 2 },
    Currency { code: "ZAR", symbol: "R", precision: 2 },
    Currency { code: "MXN", symbol: "MX$", precision: 2 },
    Currency { code: "JPY", symbol: "¥", precision: 0 },
];

/// Look up a currency by ISO 4217 code, ignoring case.
pub fn currency(code: &str) -> Option<&'static Currency> {
    let code = code.trim();
    CURRENCIES.iter().find(|c| c.code.eq_ignore_ascii_case(code))
}

fn group_digits(value: u64, separator: &str) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 * separator.len());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(ch);
    }
    out
}

/// Format `amount` in `currency` using the locale's separators and symbol
/// placement, e.g. `$1,204.50` or `1.204,50 €`.
pub fn format_money(amount: Money, currency: &Currency, format: &NumberFormat) -> String {
    format_amount(amount, currency.symbol, currency.precision, format)
}

/// Like [`format_money`] for a symbol that is not in the currency table.
pub fn format_amount(amount: Money, symbol: &str, precision: u32, format: &NumberFormat) -> String {
    let precision = precision.min(2);
    let mut abs = amount.cents().unsigned_abs();
    if precision < 2 {
        let divisor = 10u64.pow(2 - precision);
        abs = (abs + divisor / 2) / divisor;
    }
    let scale = 10u64.pow(precision);
    let units = group_digits(abs / scale, &format.thousand_separator);

    let number = if precision > 0 {
        format!(
            "{}{}{:0width$}",
            units,
            format.decimal_separator,
            abs % scale,
            width = precision as usize
        )
    } else {
        units
    };

    let sign = if amount.cents() < 0 && abs > 0 { "-" } else { "" };
    let space = if format.symbol_space && !symbol.is_empty() { " " } else { "" };
    if format.symbol_after {
        format!("{}{}{}{}", sign, number, space, symbol)
    } else {
        format!("{}{}{}{}", sign, symbol, space, number)
    }
}

/// Format a quantity with up to four decimals, trailing zeros trimmed.
pub fn format_quantity(quantity: f64, format: &NumberFormat) -> String {
    if !quantity.is_finite() {
        return "0".to_string();
    }
    let scaled = (quantity.abs() * 10_000.0).round() as u64;
    let units = group_digits(scaled / 10_000, &format.thousand_separator);
    let fraction = format!("{:04}", scaled % 10_000);
    let fraction = fraction.trim_end_matches('0');
    let sign = if quantity < 0.0 && scaled > 0 { "-" } else { "" };

    if fraction.is_empty() {
        format!("{}{}", sign, units)
    } else {
        format!("{}{}{}{}", sign, units, format.decimal_separator, fraction)
    }
}

/// Format a date with a strftime pattern, falling back to ISO 8601 if the
/// pattern cannot be applied.
pub fn format_date(date: NaiveDate, pattern: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(pattern)).is_err() {
        return date.format("%Y-%m-%d").to_string();
    }
    out
}

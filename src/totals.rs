//! Totals computation and the display formats applied at the boundary.

use serde::Serialize;

use crate::model::LineItem;

pub const CURRENCY_SYMBOL: &str = "$";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Totals {
    pub subtotal: f64,
    pub tax_amount: f64,
    pub total: f64,
}

/// Sums line totals and applies the tax rate. Order of `items` does not
/// affect the result beyond floating point summation order.
pub fn compute_totals(items: &[LineItem], tax_rate_percent: f64) -> Totals {
    let subtotal: f64 = items.iter().map(LineItem::line_total).sum();
    let tax_amount = subtotal * tax_rate_percent / 100.0;

    Totals {
        subtotal,
        tax_amount,
        total: subtotal + tax_amount,
    }
}

/// `$` followed by the value rounded to two decimals.
pub fn format_currency(value: f64) -> String {
    format!("{}{}", CURRENCY_SYMBOL, to_fixed(value, 2))
}

/// Quantity as typed numbers read back: `3`, `2.5`.
pub fn format_quantity(value: f64) -> String {
    value.to_string()
}

pub fn format_rate(value: f64) -> String {
    to_fixed(value, 2)
}

/// Rounds to `decimals` places, with exact ties going away from zero.
///
/// `{:.N}` already rounds the exact binary value correctly, except that it
/// breaks ties to even. A tie only exists when the exact expansion ends in a
/// single `5` right after the kept digits, so `1.005` (really
/// `1.00499999...`) still rounds down.
fn to_fixed(value: f64, decimals: usize) -> String {
    let exact = format!("{:.60}", value);
    let tail = exact
        .split_once('.')
        .map(|(_, frac)| frac.get(decimals..).unwrap_or(""))
        .unwrap_or("");

    let is_tie = tail.starts_with('5') && tail[1..].bytes().all(|b| b == b'0');
    if is_tie {
        let half_step = 0.5 / 10f64.powi(decimals as i32);
        format!("{:.*}", decimals, value + half_step.copysign(value))
    } else {
        format!("{:.*}", decimals, value)
    }
}

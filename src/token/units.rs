//! Conversion between whole-token decimal notation and raw units
//!
//! `parse_units("1.5", 18)` yields `1_500_000_000_000_000_000`;
//! `format_units` is the inverse and trims trailing fractional zeros.

use thiserror::Error;

/// Unit conversion errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitsError {
    #[error("Empty amount")]
    Empty,
    #[error("Invalid amount: {0}")]
    InvalidDigit(String),
    #[error("Too many decimal places: {found} (token has {decimals})")]
    TooPrecise { found: usize, decimals: u8 },
    #[error("Amount overflows raw units: {0}")]
    Overflow(String),
}

/// 10^decimals, or `None` if it does not fit in u128
pub fn unit_scale(decimals: u8) -> Option<u128> {
    10u128.checked_pow(decimals as u32)
}

/// Parse a decimal token amount (e.g. "1000", "0.25") into raw units
pub fn parse_units(amount: &str, decimals: u8) -> Result<u128, UnitsError> {
    let amount = amount.trim().replace('_', "");
    if amount.is_empty() {
        return Err(UnitsError::Empty);
    }

    let (whole, frac) = match amount.split_once('.') {
        Some((w, f)) => (w, f),
        None => (amount.as_str(), ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(UnitsError::InvalidDigit(amount.clone()));
    }
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(whole) || !all_digits(frac) {
        return Err(UnitsError::InvalidDigit(amount.clone()));
    }
    if frac.len() > decimals as usize {
        return Err(UnitsError::TooPrecise {
            found: frac.len(),
            decimals,
        });
    }

    let overflow = || UnitsError::Overflow(amount.clone());
    let scale = unit_scale(decimals).ok_or_else(overflow)?;

    let whole_units: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| overflow())?
    };

    // Right-pad the fraction to exactly `decimals` digits
    let frac_units: u128 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac, width = decimals as usize);
        padded.parse().map_err(|_| overflow())?
    };

    whole_units
        .checked_mul(scale)
        .and_then(|w| w.checked_add(frac_units))
        .ok_or_else(overflow)
}

/// Render raw units as a decimal token amount
pub fn format_units(raw: u128, decimals: u8) -> String {
    if decimals == 0 {
        return raw.to_string();
    }

    let digits = raw.to_string();
    let decimals = decimals as usize;
    let (whole, frac) = if digits.len() > decimals {
        let split = digits.len() - decimals;
        (digits[..split].to_string(), digits[split..].to_string())
    } else {
        ("0".to_string(), format!("{:0>width$}", digits, width = decimals))
    };

    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole
    } else {
        format!("{}.{}", whole, frac)
    }
}

use crate::config::{BASIS_POINTS, FIAT_DECIMALS, TOKEN_DECIMALS, TOKEN_VALUE};

// Format any value with the requested decimals
pub fn format_value(value: u64, decimals: u8) -> String {
    let divisor = 10u64.pow(decimals as u32);
    format!(
        "{}.{:0width$}",
        value / divisor,
        value % divisor,
        width = decimals as usize
    )
}

// Format a fiat amount in minor units
pub fn format_fiat(value: u64) -> String {
    format_value(value, FIAT_DECIMALS)
}

// Format a token amount in atomic units
pub fn format_tokens(value: u64) -> String {
    format_value(value, TOKEN_DECIMALS)
}

// Fiat cost of `tokens` atomic units at `price` minor units per whole token
// Returns None on overflow
pub fn fiat_for_tokens(tokens: u64, price: u64) -> Option<u64> {
    let value = tokens as u128 * price as u128 / TOKEN_VALUE as u128;
    u64::try_from(value).ok()
}

// Token atomic units bought by `fiat` minor units at `price` per whole token
// Returns None when the price is zero or on overflow
pub fn tokens_for_fiat(fiat: u64, price: u64) -> Option<u64> {
    if price == 0 {
        return None;
    }
    let value = fiat as u128 * TOKEN_VALUE as u128 / price as u128;
    u64::try_from(value).ok()
}

// Apply a ratio expressed in basis points, rounding down
pub fn apply_basis_points(amount: u64, ratio: u16) -> u64 {
    (amount as u128 * ratio as u128 / BASIS_POINTS as u128) as u64
}

//! Ether/Wei denomination helpers.
//!
//! One Ether is `10^18` Wei. Conversions into Wei are exact; conversions
//! out of Wei into a float are approximate and meant for display and
//! tolerance checks only.

use alloy_primitives::{U256, utils};

/// Number of decimal places between Ether and Wei.
pub const ETHER_DECIMALS: usize = 18;

#[derive(Debug, thiserror::Error)]
pub enum UnitsError {
    #[error("ether amount is empty")]
    Empty,

    #[error("ether amount must not be negative: {0:?}")]
    Negative(String),

    #[error("ether amount {0:?} has more than 18 fractional digits")]
    TooPrecise(String),

    #[error("invalid ether amount {amount:?}: {source}")]
    Invalid {
        amount: String,
        #[source]
        source: utils::UnitsError,
    },
}

/// Parse a decimal Ether amount (e.g. `"1.5"`, `"10000"`) into Wei.
pub fn ether_to_wei(amount: &str) -> Result<U256, UnitsError> {
    let amount = amount.trim();

    if amount.is_empty() {
        return Err(UnitsError::Empty);
    }

    if amount.starts_with('-') {
        return Err(UnitsError::Negative(amount.to_string()));
    }

    if let Some((_, fraction)) = amount.split_once('.')
        && fraction.len() > ETHER_DECIMALS
    {
        return Err(UnitsError::TooPrecise(amount.to_string()));
    }

    utils::parse_ether(amount).map_err(|source| UnitsError::Invalid {
        amount: amount.to_string(),
        source,
    })
}

/// Convert Wei into an approximate Ether value.
pub fn wei_to_ether(wei: U256) -> f64 {
    utils::format_ether(wei).parse().unwrap_or(f64::NAN)
}

/// Exact decimal rendering of a Wei amount in Ether, without trailing zeros.
pub fn format_ether(wei: U256) -> String {
    let formatted = utils::format_ether(wei);
    match formatted.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{whole}.0")
            } else {
                format!("{whole}.{fraction}")
            }
        }
        None => format!("{formatted}.0"),
    }
}

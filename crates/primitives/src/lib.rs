//! Shared primitives for bridge supply audits.
//!
//! Holds the chain-qualified address type used by the pair catalog and the
//! Ether/Wei denomination helpers used by test harnesses and reports.

pub mod chain;
pub mod units;

pub use chain::ChainAddress;
pub use units::{UnitsError, ether_to_wei, format_ether, wei_to_ether};

//! Metrics for supply verification runs.
//!
//! Handles are no-ops unless the binary installs a `metrics` recorder.

use metrics::{Counter, Histogram, counter, histogram};

/// Supply verifier metrics
#[derive(Clone)]
pub struct VerifierMetrics {
    /// Number of bridge pairs checked
    pub pairs_verified: Counter,

    /// Pairs whose locked and minted amounts matched
    pub pairs_conserved: Counter,

    /// Pairs whose locked and minted amounts differed
    pub pairs_mismatched: Counter,

    /// Pairs that could not be checked because a call failed
    pub pairs_indeterminate: Counter,

    /// RPC call latency in seconds
    pub rpc_latency_seconds: Histogram,
}

impl Default for VerifierMetrics {
    fn default() -> Self {
        Self {
            pairs_verified: counter!("supply_audit_pairs_verified"),
            pairs_conserved: counter!("supply_audit_pairs_conserved"),
            pairs_mismatched: counter!("supply_audit_pairs_mismatched"),
            pairs_indeterminate: counter!("supply_audit_pairs_indeterminate"),
            rpc_latency_seconds: histogram!("supply_audit_rpc_latency_seconds"),
        }
    }
}

impl VerifierMetrics {
    /// Record a conserved pair
    #[inline]
    pub fn record_conserved(&self) {
        self.pairs_verified.increment(1);
        self.pairs_conserved.increment(1);
    }

    /// Record a mismatched pair
    #[inline]
    pub fn record_mismatch(&self) {
        self.pairs_verified.increment(1);
        self.pairs_mismatched.increment(1);
    }

    /// Record a pair that could not be checked
    #[inline]
    pub fn record_indeterminate(&self) {
        self.pairs_verified.increment(1);
        self.pairs_indeterminate.increment(1);
    }

    /// Record RPC latency
    #[inline]
    pub fn record_rpc_latency(&self, duration_secs: f64) {
        self.rpc_latency_seconds.record(duration_secs);
    }
}

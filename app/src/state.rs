//! Service state management.
//!
//! Holds the SIGN_MNB state machine, the configuration its parser follows
//! and a few counters. Nothing in here survives a restart.

use common::AppConfiguration;

use crate::sign_mnb::MnbSigner;

/// Service state.
pub struct ServiceState {
    /// Application configuration; sets the P1/P2 pair and depth limit.
    pub config: AppConfiguration,

    /// SIGN_MNB command state, including any suspended request.
    pub signer: MnbSigner,

    /// Statistics for debugging.
    stats: ServiceStats,
}

/// Service statistics.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    /// Number of successful sign operations.
    pub signs_completed: u64,
    /// Number of operations the user declined.
    pub signs_rejected: u64,
    /// Number of requests answered with an error status.
    pub errors: u64,
}

impl ServiceState {
    /// Create a new service state.
    pub fn new() -> Self {
        Self {
            config: AppConfiguration::default(),
            signer: MnbSigner::new(),
            stats: ServiceStats::default(),
        }
    }

    /// Record a successful signing operation.
    pub fn record_sign_success(&mut self) {
        self.stats.signs_completed += 1;
    }

    /// Record a rejected operation.
    pub fn record_sign_rejected(&mut self) {
        self.stats.signs_rejected += 1;
    }

    /// Record an error.
    pub fn record_error(&mut self) {
        self.stats.errors += 1;
    }

    /// Get current statistics.
    pub fn get_stats(&self) -> &ServiceStats {
        &self.stats
    }
}

impl Default for ServiceState {
    fn default() -> Self {
        Self::new()
    }
}

pub mod ledger;

pub use ledger::{host_cost_tier, BudgetLedger, CostTier, DEFAULT_EXTRACT_COST_ESTIMATE};

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time view of the ledger, rendered verbatim by the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStatus {
    pub used: f64,
    pub remaining: f64,
    pub request_count: u64,
    pub daily_spent: f64,
    pub daily_budget: f64,
}

/// Metrics for budget ledger monitoring
#[derive(Debug, Default)]
pub struct BudgetLedgerMetrics {
    pub reservations_allowed: AtomicU64,
    pub reservations_denied: AtomicU64,
    pub commits: AtomicU64,
}

impl BudgetLedgerMetrics {
    pub fn record_allowed(&self) {
        self.reservations_allowed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_denied(&self) {
        self.reservations_denied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_commit(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }
}

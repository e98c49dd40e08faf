use std::sync::Mutex;

use chrono::{NaiveDate, Utc};
use tracing::debug;
use url::Url;

use crate::budget::{BudgetLedgerMetrics, BudgetStatus};
use crate::error::{BudgetScope, Error, ErrorDetails};
use crate::scrape::ExtractOptions;

/// Base cost of a plain extract call against a host we have not profiled.
pub const DEFAULT_EXTRACT_COST_ESTIMATE: f64 = 0.005;

/// Per-call cost multiplier when full browser rendering is requested.
const BROWSER_RENDERING_SURCHARGE: f64 = 3.0;
/// Per-call cost multiplier when a screenshot is requested.
const SCREENSHOT_SURCHARGE: f64 = 2.0;

/// Cost class of a scraping target host.
///
/// The "no match" path is an explicit case rather than a table fallthrough, so
/// an unprofiled host is visible at the call site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CostTier {
    Known(f64),
    Unknown,
}

impl CostTier {
    pub fn base_cost(&self) -> f64 {
        match self {
            CostTier::Known(cost) => *cost,
            CostTier::Unknown => DEFAULT_EXTRACT_COST_ESTIMATE,
        }
    }
}

/// Look up the cost class for a target host.
pub fn host_cost_tier(host: &str) -> CostTier {
    match host.trim_start_matches("www.") {
        "publix.com" => CostTier::Known(0.002),
        "winndixie.com" => CostTier::Known(0.002),
        "wholefoodsmarket.com" => CostTier::Known(0.003),
        _ => CostTier::Unknown,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct BudgetState {
    total_spent: f64,
    daily_spent: f64,
    daily_reset_key: NaiveDate,
    request_count: u64,
}

/// Roll the daily spend window if the calendar day has moved past the state's
/// reset key. Pure; applied at the top of every budget check.
fn roll_if_new_day(mut state: BudgetState, today: NaiveDate) -> BudgetState {
    if state.daily_reset_key != today {
        state.daily_spent = 0.0;
        state.daily_reset_key = today;
    }
    state
}

/// Running account of extract spend against fixed total and daily caps.
///
/// Reservation (`check_and_reserve`) and commitment (`commit`) are separate
/// steps: a reservation only proves affordability, and nothing is added to the
/// spent totals until the external call has succeeded. Failed calls are never
/// billed.
#[derive(Debug)]
pub struct BudgetLedger {
    state: Mutex<BudgetState>,
    total_cap: f64,
    daily_cap: f64,
    metrics: BudgetLedgerMetrics,
}

impl BudgetLedger {
    pub fn new(total_cap: f64, daily_cap: f64) -> Self {
        Self {
            state: Mutex::new(BudgetState {
                total_spent: 0.0,
                daily_spent: 0.0,
                daily_reset_key: Utc::now().date_naive(),
                request_count: 0,
            }),
            total_cap,
            daily_cap,
            metrics: BudgetLedgerMetrics::default(),
        }
    }

    /// Estimate the cost of one extract call. Pure.
    pub fn estimate_cost(&self, target: &Url, options: &ExtractOptions) -> f64 {
        let tier = target
            .host_str()
            .map(host_cost_tier)
            .unwrap_or(CostTier::Unknown);
        let mut cost = tier.base_cost();
        if options.browser_html {
            cost *= BROWSER_RENDERING_SURCHARGE;
        }
        if options.screenshot {
            cost *= SCREENSHOT_SURCHARGE;
        }
        cost
    }

    /// Verify the estimated cost fits under both caps without spending it.
    pub fn check_and_reserve(&self, estimated_cost: f64) -> Result<(), Error> {
        self.check_and_reserve_at(estimated_cost, Utc::now().date_naive())
    }

    pub fn check_and_reserve_at(
        &self,
        estimated_cost: f64,
        today: NaiveDate,
    ) -> Result<(), Error> {
        let mut state = self.lock_state();
        *state = roll_if_new_day(*state, today);

        if state.total_spent + estimated_cost > self.total_cap {
            self.metrics.record_denied();
            return Err(Error::new(ErrorDetails::BudgetExceeded {
                scope: BudgetScope::Total,
                estimated_cost,
                remaining: self.total_cap - state.total_spent,
            }));
        }
        if state.daily_spent + estimated_cost > self.daily_cap {
            self.metrics.record_denied();
            return Err(Error::new(ErrorDetails::BudgetExceeded {
                scope: BudgetScope::Daily,
                estimated_cost,
                remaining: self.daily_cap - state.daily_spent,
            }));
        }

        self.metrics.record_allowed();
        Ok(())
    }

    /// Non-erroring variant of `check_and_reserve`, for callers that want to
    /// route to fallback data without attempting a scrape at all.
    pub fn can_afford(&self, estimated_cost: f64) -> bool {
        self.can_afford_at(estimated_cost, Utc::now().date_naive())
    }

    pub fn can_afford_at(&self, estimated_cost: f64, today: NaiveDate) -> bool {
        let mut state = self.lock_state();
        *state = roll_if_new_day(*state, today);

        state.total_spent + estimated_cost <= self.total_cap
            && state.daily_spent + estimated_cost <= self.daily_cap
    }

    /// Account a successful extract call.
    pub fn commit(&self, actual_cost: f64) {
        self.commit_at(actual_cost, Utc::now().date_naive());
    }

    pub fn commit_at(&self, actual_cost: f64, today: NaiveDate) {
        let mut state = self.lock_state();
        *state = roll_if_new_day(*state, today);

        state.total_spent += actual_cost;
        state.daily_spent += actual_cost;
        state.request_count += 1;
        self.metrics.record_commit();

        debug!(
            cost = actual_cost,
            total_spent = state.total_spent,
            daily_spent = state.daily_spent,
            "Committed extract cost to budget ledger"
        );
    }

    pub fn snapshot(&self) -> BudgetStatus {
        self.snapshot_at(Utc::now().date_naive())
    }

    pub fn snapshot_at(&self, today: NaiveDate) -> BudgetStatus {
        let mut state = self.lock_state();
        *state = roll_if_new_day(*state, today);

        BudgetStatus {
            used: state.total_spent,
            remaining: self.total_cap - state.total_spent,
            request_count: state.request_count,
            daily_spent: state.daily_spent,
            daily_budget: self.daily_cap,
        }
    }

    pub fn metrics(&self) -> &BudgetLedgerMetrics {
        &self.metrics
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, BudgetState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn options() -> ExtractOptions {
        ExtractOptions::default()
    }

    #[test]
    fn test_estimate_cost_tiers() {
        let ledger = BudgetLedger::new(5.00, 1.00);

        let publix = Url::parse("https://www.publix.com/search?query=milk").unwrap();
        let whole_foods = Url::parse("https://www.wholefoodsmarket.com/search").unwrap();
        let unknown = Url::parse("https://grocery.example.com/milk").unwrap();

        assert_eq!(ledger.estimate_cost(&publix, &options()), 0.002);
        assert_eq!(ledger.estimate_cost(&whole_foods, &options()), 0.003);
        assert_eq!(ledger.estimate_cost(&unknown, &options()), 0.005);
    }

    #[test]
    fn test_estimate_cost_surcharges() {
        let ledger = BudgetLedger::new(5.00, 1.00);
        let publix = Url::parse("https://www.publix.com/search?query=milk").unwrap();

        let browser = ExtractOptions {
            browser_html: true,
            ..Default::default()
        };
        assert!((ledger.estimate_cost(&publix, &browser) - 0.006).abs() < 1e-12);

        let both = ExtractOptions {
            browser_html: true,
            screenshot: true,
            ..Default::default()
        };
        assert!((ledger.estimate_cost(&publix, &both) - 0.012).abs() < 1e-12);
    }

    #[test]
    fn test_reserve_does_not_mutate_spend() {
        let ledger = BudgetLedger::new(5.00, 1.00);
        let today = day("2025-03-01");

        ledger.check_and_reserve_at(0.5, today).unwrap();
        ledger.check_and_reserve_at(0.5, today).unwrap();

        let status = ledger.snapshot_at(today);
        assert_eq!(status.used, 0.0);
        assert_eq!(status.daily_spent, 0.0);
        assert_eq!(status.request_count, 0);
    }

    #[test]
    fn test_commit_accumulates() {
        let ledger = BudgetLedger::new(5.00, 1.00);
        let today = day("2025-03-01");

        ledger.commit_at(0.002, today);
        ledger.commit_at(0.003, today);
        ledger.commit_at(0.005, today);

        let status = ledger.snapshot_at(today);
        assert!((status.used - 0.010).abs() < 1e-9);
        assert!((status.daily_spent - 0.010).abs() < 1e-9);
        assert_eq!(status.request_count, 3);
    }

    #[test]
    fn test_total_cap_denies_with_scope() {
        let ledger = BudgetLedger::new(0.004, 1.00);
        let today = day("2025-03-01");

        ledger.commit_at(0.003, today);
        let err = ledger.check_and_reserve_at(0.002, today).unwrap_err();

        match err.get_details() {
            ErrorDetails::BudgetExceeded { scope, .. } => {
                assert_eq!(*scope, BudgetScope::Total);
            }
            other => panic!("unexpected error details: {other:?}"),
        }
    }

    #[test]
    fn test_daily_cap_denies_with_scope() {
        let ledger = BudgetLedger::new(5.00, 0.004);
        let today = day("2025-03-01");

        ledger.commit_at(0.003, today);
        let err = ledger.check_and_reserve_at(0.002, today).unwrap_err();

        match err.get_details() {
            ErrorDetails::BudgetExceeded { scope, .. } => {
                assert_eq!(*scope, BudgetScope::Daily);
            }
            other => panic!("unexpected error details: {other:?}"),
        }
    }

    #[test]
    fn test_daily_window_rolls_on_new_day() {
        let ledger = BudgetLedger::new(5.00, 0.01);

        ledger.commit_at(0.01, day("2025-03-01"));
        assert!(!ledger.can_afford_at(0.002, day("2025-03-01")));

        // Any budget-checking operation on the next day observes a fresh window
        assert!(ledger.can_afford_at(0.002, day("2025-03-02")));
        let status = ledger.snapshot_at(day("2025-03-02"));
        assert_eq!(status.daily_spent, 0.0);
        // Total spend does not roll
        assert!((status.used - 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_exact_fit_is_affordable() {
        let ledger = BudgetLedger::new(1.00, 1.00);
        let today = day("2025-03-01");

        assert!(ledger.can_afford_at(1.00, today));
        ledger.check_and_reserve_at(1.00, today).unwrap();
    }
}

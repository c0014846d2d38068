use super::predicates::MatchBreakdown;
use crate::domain::FundingProgram;
use std::sync::Mutex;
use tracing::debug;

/// Receives the per-program predicate breakdown while a query is evaluated.
///
/// Observers only watch; the engine ignores anything they do.
pub trait MatchObserver: Send + Sync {
    fn observe(&self, program: &FundingProgram, breakdown: &MatchBreakdown);
}

/// Default observer, does nothing.
pub struct NoopObserver;

impl MatchObserver for NoopObserver {
    fn observe(&self, _program: &FundingProgram, _breakdown: &MatchBreakdown) {}
}

/// Logs every breakdown at debug level.
pub struct TracingObserver;

impl MatchObserver for TracingObserver {
    fn observe(&self, program: &FundingProgram, breakdown: &MatchBreakdown) {
        debug!(
            funding_option = %program.name,
            state_match = breakdown.region_match,
            company_size_match = breakdown.size_match,
            areas_match = breakdown.area_match,
            grant_match = breakdown.grant_match,
            revenue_match = breakdown.revenue_match,
            "Evaluated funding option"
        );
    }
}

/// Keeps every breakdown in evaluation order.
#[derive(Default)]
pub struct CollectingObserver {
    entries: Mutex<Vec<(String, MatchBreakdown)>>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_entries(self) -> Vec<(String, MatchBreakdown)> {
        self.entries.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MatchObserver for CollectingObserver {
    fn observe(&self, program: &FundingProgram, breakdown: &MatchBreakdown) {
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.push((program.name.clone(), *breakdown));
    }
}

//! Eligibility filtering and ranking.
//!
//! The engine is a pure function of a catalog snapshot and a query. Every
//! program is checked against the five eligibility predicates, survivors are
//! ranked by the composite key and the top of the list is returned.

pub mod observer;
pub mod predicates;

pub use observer::{CollectingObserver, MatchObserver, NoopObserver, TracingObserver};
pub use predicates::MatchBreakdown;

use crate::catalog::Catalog;
use crate::constants::DEFAULT_MAX_RESULTS;
use crate::domain::{FundingProgram, FundingQuery};
use crate::error::MatchError;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Cap on returned programs; `None` returns every eligible program.
    pub max_results: Option<usize>,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            max_results: Some(DEFAULT_MAX_RESULTS),
        }
    }
}

/// Ranked result of one query.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome<'a> {
    /// Best programs first, at most `max_results` of them
    pub programs: Vec<&'a FundingProgram>,
    /// Eligible programs before the cap was applied
    pub eligible: usize,
}

pub fn find_best_funding<'a>(
    catalog: &'a Catalog,
    query: &FundingQuery,
    options: &MatchOptions,
) -> Result<MatchOutcome<'a>, MatchError> {
    let eligible = catalog
        .programs()
        .iter()
        .filter(|program| predicates::is_eligible(program, query))
        .collect();
    finish(eligible, options)
}

/// Same as [`find_best_funding`], reporting each program's breakdown to `observer`.
pub fn find_best_funding_observed<'a>(
    catalog: &'a Catalog,
    query: &FundingQuery,
    options: &MatchOptions,
    observer: &dyn MatchObserver,
) -> Result<MatchOutcome<'a>, MatchError> {
    let mut eligible = Vec::new();
    for program in catalog.programs() {
        let breakdown = MatchBreakdown::evaluate(program, query);
        observer.observe(program, &breakdown);
        if breakdown.is_eligible() {
            eligible.push(program);
        }
    }
    finish(eligible, options)
}

fn finish<'a>(mut eligible: Vec<&'a FundingProgram>, options: &MatchOptions) -> Result<MatchOutcome<'a>, MatchError> {
    if eligible.is_empty() {
        return Err(MatchError::NoMatchFound);
    }

    rank(&mut eligible);
    let count = eligible.len();
    if let Some(max) = options.max_results {
        eligible.truncate(max);
    }

    Ok(MatchOutcome {
        programs: eligible,
        eligible: count,
    })
}

/// Stable sort by the composite ranking key. Equal keys keep catalog order.
pub fn rank(programs: &mut [&FundingProgram]) {
    programs.sort_by(|a, b| compare_rank(a, b));
}

/// Benefit/cost score descending, then approval rate descending, then time required ascending.
pub fn compare_rank(a: &FundingProgram, b: &FundingProgram) -> Ordering {
    b.benefit_cost_score
        .total_cmp(&a.benefit_cost_score)
        .then_with(|| b.approval_rate.total_cmp(&a.approval_rate))
        .then_with(|| a.time_required.total_cmp(&b.time_required))
}

use crate::constants::NATIONWIDE_REGION;
use crate::domain::{FundingProgram, FundingQuery};
use serde::Serialize;

/// Per-predicate outcome for one program against one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchBreakdown {
    pub region_match: bool,
    pub size_match: bool,
    pub area_match: bool,
    pub grant_match: bool,
    pub revenue_match: bool,
}

impl MatchBreakdown {
    pub fn evaluate(program: &FundingProgram, query: &FundingQuery) -> Self {
        Self {
            region_match: region_match(program, query),
            size_match: size_match(program, query),
            area_match: area_match(program, query),
            grant_match: grant_match(program, query),
            revenue_match: revenue_match(program, query),
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.region_match && self.size_match && self.area_match && self.grant_match && self.revenue_match
    }
}

/// Nationwide queries see every program; nationwide programs are seen by every query.
pub fn region_match(program: &FundingProgram, query: &FundingQuery) -> bool {
    query.applicant_region == NATIONWIDE_REGION
        || program.regions.contains(&query.applicant_region)
        || program.regions.contains(NATIONWIDE_REGION)
}

pub fn size_match(program: &FundingProgram, query: &FundingQuery) -> bool {
    program.company_size_class == query.company_size_class
}

pub fn area_match(program: &FundingProgram, query: &FundingQuery) -> bool {
    !program.area_tags.is_disjoint(&query.desired_areas)
}

pub fn grant_match(program: &FundingProgram, query: &FundingQuery) -> bool {
    query.requested_grant <= program.grant_volume
}

pub fn revenue_match(program: &FundingProgram, query: &FundingQuery) -> bool {
    query.applicant_revenue <= program.revenue_max
}

/// Short-circuiting form of [`MatchBreakdown::is_eligible`].
pub fn is_eligible(program: &FundingProgram, query: &FundingQuery) -> bool {
    size_match(program, query)
        && grant_match(program, query)
        && revenue_match(program, query)
        && region_match(program, query)
        && area_match(program, query)
}

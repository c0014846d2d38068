use crate::constants::NATIONWIDE_REGION;
use crate::error::MatchError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One funding program from the catalog, normalized at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingProgram {
    #[serde(rename = "funding_option")]
    pub name: String,
    #[serde(rename = "state")]
    pub regions: BTreeSet<String>,
    #[serde(rename = "company_size")]
    pub company_size_class: String,
    #[serde(rename = "areas")]
    pub area_tags: BTreeSet<String>,
    pub grant_volume: i64,
    pub revenue_max: i64,
    pub benefit_cost_score: f64,
    pub approval_rate: f64,
    pub time_required: f64,
}

impl FundingProgram {
    pub fn is_nationwide(&self) -> bool {
        self.regions.contains(NATIONWIDE_REGION)
    }
}

/// Request body of `POST /find-best-funding`, field names as the front end sends them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingRequest {
    pub state: String,
    pub company_size: String,
    pub areas: Vec<String>,
    pub grant: i64,
    pub revenue: i64,
}

/// A validated applicant query.
#[derive(Debug, Clone, PartialEq)]
pub struct FundingQuery {
    pub applicant_region: String,
    pub company_size_class: String,
    pub desired_areas: BTreeSet<String>,
    pub requested_grant: i64,
    pub applicant_revenue: i64,
}

impl FundingQuery {
    pub fn new(
        applicant_region: impl Into<String>,
        company_size_class: impl Into<String>,
        desired_areas: impl IntoIterator<Item = impl Into<String>>,
        requested_grant: i64,
        applicant_revenue: i64,
    ) -> Result<Self, MatchError> {
        let desired_areas: BTreeSet<String> = desired_areas.into_iter().map(Into::into).collect();
        if desired_areas.is_empty() {
            return Err(MatchError::InvalidQuery(
                "at least one desired area is required".to_string(),
            ));
        }

        Ok(Self {
            applicant_region: applicant_region.into(),
            company_size_class: company_size_class.into(),
            desired_areas,
            requested_grant,
            applicant_revenue,
        })
    }

    pub fn is_nationwide(&self) -> bool {
        self.applicant_region == NATIONWIDE_REGION
    }
}

impl TryFrom<FundingRequest> for FundingQuery {
    type Error = MatchError;

    fn try_from(request: FundingRequest) -> Result<Self, Self::Error> {
        FundingQuery::new(
            request.state,
            request.company_size,
            request.areas,
            request.grant,
            request.revenue,
        )
    }
}

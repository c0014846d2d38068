//! Prometheus metrics for catalog loading and matching.
//!
//! Recording is always safe: without an installed recorder the `metrics`
//! macros are no-ops, so tests and the CLI pay nothing.

use std::fmt;
use std::net::SocketAddr;
use tracing::info;

/// Every metric name used by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    CatalogLoadsSuccess,
    CatalogLoadsError,
    CatalogPrograms,
    CatalogRecordsSkipped,
    CatalogFieldsRecovered,

    MatchQueries,
    MatchNoMatch,
    MatchInvalidQuery,
    MatchEligiblePrograms,
    MatchDuration,

    LookupRequests,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::CatalogLoadsSuccess => "funding_catalog_loads_success_total",
            MetricName::CatalogLoadsError => "funding_catalog_loads_error_total",
            MetricName::CatalogPrograms => "funding_catalog_programs",
            MetricName::CatalogRecordsSkipped => "funding_catalog_records_skipped_total",
            MetricName::CatalogFieldsRecovered => "funding_catalog_fields_recovered_total",

            MetricName::MatchQueries => "funding_match_queries_total",
            MetricName::MatchNoMatch => "funding_match_no_match_total",
            MetricName::MatchInvalidQuery => "funding_match_invalid_query_total",
            MetricName::MatchEligiblePrograms => "funding_match_eligible_programs",
            MetricName::MatchDuration => "funding_match_duration_seconds",

            MetricName::LookupRequests => "funding_lookup_requests_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Install the Prometheus recorder with its own HTTP listener on `addr`.
pub fn init(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))?;

    info!(%addr, "Metrics exporter listening");
    Ok(())
}

pub mod catalog {
    use super::MetricName;

    pub fn load_success(programs: usize) {
        ::metrics::counter!(MetricName::CatalogLoadsSuccess.as_str()).increment(1);
        ::metrics::gauge!(MetricName::CatalogPrograms.as_str()).set(programs as f64);
    }

    pub fn load_error() {
        ::metrics::counter!(MetricName::CatalogLoadsError.as_str()).increment(1);
    }

    pub fn records_skipped(count: u64) {
        ::metrics::counter!(MetricName::CatalogRecordsSkipped.as_str()).increment(count);
    }

    pub fn fields_recovered(count: u64) {
        ::metrics::counter!(MetricName::CatalogFieldsRecovered.as_str()).increment(count);
    }
}

pub mod matching {
    use super::MetricName;

    pub fn query_matched(eligible: usize, secs: f64) {
        ::metrics::counter!(MetricName::MatchQueries.as_str()).increment(1);
        ::metrics::histogram!(MetricName::MatchEligiblePrograms.as_str()).record(eligible as f64);
        ::metrics::histogram!(MetricName::MatchDuration.as_str()).record(secs);
    }

    pub fn no_match(secs: f64) {
        ::metrics::counter!(MetricName::MatchQueries.as_str()).increment(1);
        ::metrics::counter!(MetricName::MatchNoMatch.as_str()).increment(1);
        ::metrics::histogram!(MetricName::MatchDuration.as_str()).record(secs);
    }

    pub fn invalid_query() {
        ::metrics::counter!(MetricName::MatchInvalidQuery.as_str()).increment(1);
    }
}

pub mod lookup {
    use super::MetricName;

    pub fn request(operation: &'static str, found: bool) {
        let outcome = if found { "found" } else { "not_found" };
        ::metrics::counter!(
            MetricName::LookupRequests.as_str(),
            "operation" => operation,
            "outcome" => outcome
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_follow_prometheus_conventions() {
        let counters = [
            MetricName::CatalogLoadsSuccess,
            MetricName::CatalogRecordsSkipped,
            MetricName::MatchQueries,
            MetricName::MatchNoMatch,
            MetricName::LookupRequests,
        ];
        for name in counters {
            assert!(name.as_str().starts_with("funding_"));
            assert!(name.as_str().ends_with("_total"), "{name}");
        }
        assert!(MetricName::MatchDuration.to_string().ends_with("_seconds"));
    }

    #[test]
    fn test_recording_without_recorder_is_harmless() {
        catalog::load_success(3);
        matching::query_matched(2, 0.001);
        matching::no_match(0.001);
        lookup::request("by_name", false);
    }
}

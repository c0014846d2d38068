use super::normalize::{json_kind, normalize_multi_value};
use super::Catalog;
use crate::domain::FundingProgram;
use crate::error::{CatalogError, Result};
use crate::observability::metrics;
use chrono::Utc;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// One catalog record as it appears in the source, before normalization.
#[derive(Debug, Deserialize)]
struct RawFundingRecord {
    #[serde(alias = "funding option")]
    funding_option: String,
    #[serde(default)]
    state: Value,
    company_size: String,
    #[serde(default)]
    areas: Value,
    #[serde(deserialize_with = "lenient_integer")]
    grant_volume: i64,
    #[serde(deserialize_with = "lenient_integer")]
    revenue_max: i64,
    #[serde(deserialize_with = "lenient_number")]
    benefit_cost_score: f64,
    #[serde(deserialize_with = "lenient_number")]
    approval_rate: f64,
    #[serde(deserialize_with = "lenient_number")]
    time_required: f64,
}

/// A record that could not be turned into a program.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    pub index: usize,
    pub name: Option<String>,
    pub reason: String,
}

/// Summary of one catalog load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_records: usize,
    pub loaded: usize,
    pub skipped: Vec<SkippedRecord>,
    /// Region/area fields that needed the single-element fallback
    pub recovered_fields: usize,
}

/// Build a catalog from the raw bytes of a JSON array.
///
/// Only an unparseable document or a non-array root is fatal. Bad records are
/// skipped and bad list fields fall back to a single literal element.
pub fn load_catalog_from_slice(bytes: &[u8], location: &str) -> Result<(Catalog, LoadReport)> {
    let document: Value = serde_json::from_slice(bytes)?;
    let records = match document {
        Value::Array(records) => records,
        other => {
            return Err(CatalogError::NotAnArray {
                found: json_kind(&other),
            })
        }
    };

    let mut report = LoadReport {
        total_records: records.len(),
        ..LoadReport::default()
    };
    let mut seen_names = HashSet::new();
    let mut programs = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let raw = match RawFundingRecord::deserialize(record) {
            Ok(raw) => raw,
            Err(e) => {
                let name = record_name(record);
                warn!(index, name = ?name, error = %e, "Skipping catalog record");
                report.skipped.push(SkippedRecord {
                    index,
                    name,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if !seen_names.insert(raw.funding_option.to_lowercase()) {
            warn!(index, name = %raw.funding_option, "Skipping duplicate funding option");
            report.skipped.push(SkippedRecord {
                index,
                name: Some(raw.funding_option.clone()),
                reason: "duplicate funding option name".to_string(),
            });
            continue;
        }

        let (program, recovered) = normalize_record(raw);
        report.recovered_fields += recovered;
        programs.push(program);
    }

    report.loaded = programs.len();
    let catalog = Catalog {
        programs,
        fingerprint: fingerprint(bytes),
        source: location.to_string(),
        loaded_at: Utc::now(),
    };

    metrics::catalog::records_skipped(report.skipped.len() as u64);
    metrics::catalog::fields_recovered(report.recovered_fields as u64);
    info!(
        source = location,
        loaded = report.loaded,
        skipped = report.skipped.len(),
        recovered_fields = report.recovered_fields,
        fingerprint = %catalog.fingerprint,
        "Catalog loaded"
    );

    Ok((catalog, report))
}

fn normalize_record(raw: RawFundingRecord) -> (FundingProgram, usize) {
    let mut recovered = 0;
    let regions = normalize_multi_value(&raw.state);
    if let Some(reason) = &regions.recovered {
        debug!(name = %raw.funding_option, field = "state", reason = %reason, "Recovered malformed field");
        recovered += 1;
    }
    let areas = normalize_multi_value(&raw.areas);
    if let Some(reason) = &areas.recovered {
        debug!(name = %raw.funding_option, field = "areas", reason = %reason, "Recovered malformed field");
        recovered += 1;
    }

    let program = FundingProgram {
        name: raw.funding_option,
        regions: regions.values,
        company_size_class: raw.company_size,
        area_tags: areas.values,
        grant_volume: raw.grant_volume,
        revenue_max: raw.revenue_max,
        benefit_cost_score: raw.benefit_cost_score,
        approval_rate: raw.approval_rate,
        time_required: raw.time_required,
    };
    (program, recovered)
}

fn record_name(record: &Value) -> Option<String> {
    record
        .get("funding_option")
        .or_else(|| record.get("funding option"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let parsed = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|f| f.is_finite())
        .ok_or_else(|| serde::de::Error::custom(format!("expected a finite number, found {value}")))
}

fn lenient_integer<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let parsed = match &value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        _ => None,
    };
    parsed.ok_or_else(|| serde::de::Error::custom(format!("expected an integer, found {value}")))
}

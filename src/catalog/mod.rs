pub mod loader;
pub mod normalize;
pub mod source;

pub use loader::{load_catalog_from_slice, LoadReport, SkippedRecord};
pub use source::{source_for_location, CatalogSource, FileCatalogSource, HttpCatalogSource};

use crate::domain::FundingProgram;
use crate::error::Result;
use crate::observability::metrics;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, RwLock};
use tracing::{error, info};

/// Immutable, normalized funding catalog. One value is one snapshot.
#[derive(Debug, Clone)]
pub struct Catalog {
    programs: Vec<FundingProgram>,
    fingerprint: String,
    source: String,
    loaded_at: DateTime<Utc>,
}

impl Catalog {
    /// Build a snapshot from already-normalized programs, keeping their order.
    pub fn from_programs(programs: Vec<FundingProgram>) -> Self {
        let fingerprint = serde_json::to_vec(&programs)
            .map(|bytes| loader::fingerprint(&bytes))
            .unwrap_or_default();
        Self {
            programs,
            fingerprint,
            source: "memory".to_string(),
            loaded_at: Utc::now(),
        }
    }

    /// Programs in catalog order.
    pub fn programs(&self) -> &[FundingProgram] {
        &self.programs
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Case-insensitive lookup by program name.
    pub fn find_by_name(&self, name: &str) -> Option<&FundingProgram> {
        let name = name.to_lowercase();
        self.programs.iter().find(|p| p.name.to_lowercase() == name)
    }

    /// Programs whose region set contains `region` exactly.
    pub fn filter_by_region(&self, region: &str) -> Vec<&FundingProgram> {
        self.programs.iter().filter(|p| p.regions.contains(region)).collect()
    }

    /// Programs whose size class equals `size_class`, ignoring case.
    pub fn filter_by_size_class(&self, size_class: &str) -> Vec<&FundingProgram> {
        let size_class = size_class.to_lowercase();
        self.programs
            .iter()
            .filter(|p| p.company_size_class.to_lowercase() == size_class)
            .collect()
    }

    pub fn summary(&self) -> CatalogSummary {
        CatalogSummary {
            programs: self.len(),
            fingerprint: self.fingerprint.clone(),
            source: self.source.clone(),
            loaded_at: self.loaded_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogSummary {
    pub programs: usize,
    pub fingerprint: String,
    pub source: String,
    pub loaded_at: DateTime<Utc>,
}

/// Load a full snapshot from a source.
pub async fn load_catalog(source: &dyn CatalogSource) -> Result<(Catalog, LoadReport)> {
    let location = source.location();
    let loaded = source
        .fetch()
        .await
        .and_then(|bytes| load_catalog_from_slice(&bytes, &location));

    match &loaded {
        Ok((catalog, _)) => metrics::catalog::load_success(catalog.len()),
        Err(e) => {
            error!(source = %location, error = %e, "Catalog load failed");
            metrics::catalog::load_error();
        }
    }
    loaded
}

/// Shared handle to the current catalog snapshot.
///
/// Readers clone the inner `Arc` and drop the lock immediately, so a reload
/// never exposes a half-built catalog and never blocks on in-flight matching.
#[derive(Clone)]
pub struct CatalogHandle {
    current: Arc<RwLock<Arc<Catalog>>>,
}

impl CatalogHandle {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(catalog))),
        }
    }

    pub fn snapshot(&self) -> Arc<Catalog> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Replace the snapshot, returning the previous one.
    pub fn replace(&self, catalog: Catalog) -> Arc<Catalog> {
        let next = Arc::new(catalog);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::replace(&mut *guard, next)
    }

    /// Load a fresh catalog and swap it in. On failure the current snapshot stays.
    pub async fn reload_from(&self, source: &dyn CatalogSource) -> Result<(Arc<Catalog>, LoadReport)> {
        let (catalog, report) = load_catalog(source).await?;
        let previous = self.replace(catalog);
        let current = self.snapshot();
        info!(
            previous = %previous.fingerprint(),
            current = %current.fingerprint(),
            programs = current.len(),
            "Catalog snapshot replaced"
        );
        Ok((current, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn program(name: &str, regions: &[&str], size: &str) -> FundingProgram {
        FundingProgram {
            name: name.to_string(),
            regions: regions.iter().map(|r| r.to_string()).collect(),
            company_size_class: size.to_string(),
            area_tags: BTreeSet::from(["digital".to_string()]),
            grant_volume: 10_000,
            revenue_max: 100_000,
            benefit_cost_score: 5.0,
            approval_rate: 0.5,
            time_required: 10.0,
        }
    }

    fn catalog() -> Catalog {
        Catalog::from_programs(vec![
            program("Digital Bonus Bayern", &["Bayern"], "small"),
            program("KfW Innovation", &["bundesweit"], "Medium"),
            program("Berlin Start", &["Berlin", "Brandenburg"], "small"),
        ])
    }

    #[test]
    fn test_name_lookup_ignores_case() {
        let catalog = catalog();
        assert_eq!(catalog.find_by_name("kfw innovation").unwrap().name, "KfW Innovation");
        assert!(catalog.find_by_name("unknown").is_none());
    }

    #[test]
    fn test_region_filter_is_exact_membership() {
        let catalog = catalog();
        let names: Vec<_> = catalog.filter_by_region("Berlin").iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Berlin Start"]);
        assert!(catalog.filter_by_region("berlin").is_empty());
    }

    #[test]
    fn test_size_filter_ignores_case_and_keeps_order() {
        let catalog = catalog();
        let small: Vec<_> = catalog.filter_by_size_class("SMALL").iter().map(|p| p.name.as_str()).collect();
        assert_eq!(small, vec!["Digital Bonus Bayern", "Berlin Start"]);
        assert_eq!(catalog.filter_by_size_class("medium").len(), 1);
    }

    #[test]
    fn test_handle_swaps_whole_snapshots() {
        let handle = CatalogHandle::new(catalog());
        let before = handle.snapshot();
        assert_eq!(before.len(), 3);

        let previous = handle.replace(Catalog::from_programs(vec![program("Only", &["Hessen"], "large")]));
        assert!(Arc::ptr_eq(&previous, &before));
        // snapshots taken earlier keep their catalog
        assert_eq!(before.len(), 3);
        assert_eq!(handle.snapshot().len(), 1);
    }
}

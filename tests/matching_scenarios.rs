use funding_matcher::catalog::load_catalog_from_slice;
use funding_matcher::{find_best_funding, Catalog, FundingQuery, MatchError, MatchOptions};
use serde_json::json;

fn fixture_catalog() -> Catalog {
    let (catalog, report) = load_catalog_from_slice(include_bytes!("fixtures/catalog.json"), "fixture").unwrap();
    assert!(report.skipped.is_empty());
    catalog
}

fn catalog_from(value: serde_json::Value) -> Catalog {
    load_catalog_from_slice(&serde_json::to_vec(&value).unwrap(), "inline").unwrap().0
}

fn query(state: &str, size: &str, areas: &[&str], grant: i64, revenue: i64) -> FundingQuery {
    FundingQuery::new(state, size, areas.iter().copied(), grant, revenue).unwrap()
}

fn names(catalog: &Catalog, q: &FundingQuery, options: &MatchOptions) -> Result<Vec<String>, MatchError> {
    find_best_funding(catalog, q, options).map(|outcome| outcome.programs.iter().map(|p| p.name.clone()).collect())
}

fn program(name: &str, regions: &[&str], score: f64, approval: f64, time: f64) -> serde_json::Value {
    json!({
        "funding_option": name,
        "state": regions,
        "company_size": "small",
        "areas": ["digital"],
        "grant_volume": 50000,
        "revenue_max": 1000000,
        "benefit_cost_score": score,
        "approval_rate": approval,
        "time_required": time
    })
}

#[test]
fn test_fixture_encodings_normalize_to_sets() {
    let catalog = fixture_catalog();
    assert_eq!(catalog.len(), 6);

    let hessen = catalog.find_by_name("Hessen Mittelstand").unwrap();
    assert_eq!(
        hessen.regions.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["Hessen", "Rheinland-Pfalz"]
    );

    let berlin = catalog.find_by_name("berlin innovativ").unwrap();
    assert!(berlin.regions.contains("Berlin"));
    assert!(berlin.area_tags.contains("innovation") && berlin.area_tags.contains("digital"));

    assert!(catalog.find_by_name("go-digital").unwrap().is_nationwide());
    assert!(catalog.find_by_name("ZIM Einzelprojekt").unwrap().is_nationwide());
}

#[test]
fn test_concrete_region_also_sees_nationwide_programs() {
    let catalog = fixture_catalog();
    let result = names(&catalog, &query("Bayern", "small", &["digital"], 10_000, 500_000), &MatchOptions::default());
    assert_eq!(result.unwrap(), vec!["Digitalbonus Bayern", "go-digital"]);

    let result = names(&catalog, &query("Berlin", "small", &["digital"], 10_000, 500_000), &MatchOptions::default());
    assert_eq!(result.unwrap(), vec!["go-digital", "Berlin Innovativ"]);
}

#[test]
fn test_nationwide_query_ignores_program_regions() {
    let catalog = fixture_catalog();
    let result = names(
        &catalog,
        &query("bundesweit", "small", &["digital"], 10_000, 500_000),
        &MatchOptions::default(),
    );
    assert_eq!(result.unwrap(), vec!["Digitalbonus Bayern", "go-digital", "Berlin Innovativ"]);
}

#[test]
fn test_raising_the_grant_drops_programs() {
    let catalog = fixture_catalog();
    let options = MatchOptions::default();

    let within = names(&catalog, &query("Bayern", "small", &["digital"], 16_500, 500_000), &options).unwrap();
    assert_eq!(within, vec!["Digitalbonus Bayern", "go-digital"]);

    let above = names(&catalog, &query("Bayern", "small", &["digital"], 16_501, 500_000), &options).unwrap();
    assert_eq!(above, vec!["Digitalbonus Bayern"]);

    let too_much = names(&catalog, &query("Bayern", "small", &["digital"], 60_000, 500_000), &options);
    assert_eq!(too_much, Err(MatchError::NoMatchFound));
}

#[test]
fn test_lowering_revenue_keeps_programs_eligible() {
    let catalog = fixture_catalog();
    let options = MatchOptions::default();
    let high = names(&catalog, &query("Bayern", "small", &["digital"], 10_000, 1_000_000), &options).unwrap();
    let low = names(&catalog, &query("Bayern", "small", &["digital"], 10_000, 1), &options).unwrap();
    assert_eq!(high, low);

    let over = names(&catalog, &query("Bayern", "small", &["digital"], 10_000, 1_000_001), &options).unwrap();
    assert_eq!(over, vec!["go-digital"]);
}

#[test]
fn test_single_program_region_scenario() {
    let catalog = catalog_from(json!([program("Bavaria Digital", &["Bavaria"], 8.0, 0.7, 30.0)]));
    let options = MatchOptions::default();

    let found = names(&catalog, &query("Bavaria", "small", &["digital"], 10_000, 500_000), &options);
    assert_eq!(found.unwrap(), vec!["Bavaria Digital"]);

    let missing = names(&catalog, &query("Berlin", "small", &["digital"], 10_000, 500_000), &options);
    assert_eq!(missing, Err(MatchError::NoMatchFound));
}

#[test]
fn test_shorter_processing_time_breaks_ties() {
    let catalog = catalog_from(json!([
        program("slow", &["bundesweit"], 8.0, 0.7, 20.0),
        program("fast", &["bundesweit"], 8.0, 0.7, 10.0),
    ]));

    let result = names(&catalog, &query("Berlin", "small", &["digital"], 1, 1), &MatchOptions::default());
    assert_eq!(result.unwrap(), vec!["fast", "slow"]);
}

#[test]
fn test_cap_is_configurable() {
    let catalog = catalog_from(json!((0..5)
        .map(|i| program(&format!("p{i}"), &["bundesweit"], 5.0, 0.5, 10.0))
        .collect::<Vec<_>>()));
    let q = query("Hamburg", "small", &["digital"], 1, 1);

    let capped = find_best_funding(&catalog, &q, &MatchOptions::default()).unwrap();
    assert_eq!(capped.programs.len(), 3);
    assert_eq!(capped.eligible, 5);
    // equal keys: catalog order survives the cap
    assert_eq!(
        capped.programs.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
        vec!["p0", "p1", "p2"]
    );

    let uncapped = find_best_funding(&catalog, &q, &MatchOptions { max_results: None }).unwrap();
    assert_eq!(uncapped.programs.len(), 5);
}

#[test]
fn test_program_listing_its_region_and_bundesweit_appears_once() {
    let catalog = fixture_catalog();
    let nrw = catalog.find_by_name("Energieeffizienz NRW").unwrap();
    assert!(nrw.regions.contains("Nordrhein-Westfalen") && nrw.is_nationwide());

    let q = query("Nordrhein-Westfalen", "medium", &["energy"], 50_000, 1_000_000);
    let outcome = find_best_funding(&catalog, &q, &MatchOptions { max_results: None }).unwrap();
    assert_eq!(outcome.eligible, 1);
    assert_eq!(
        outcome.programs.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
        vec!["Energieeffizienz NRW"]
    );

    // Also once when areas overlap other nationwide programs
    let q = query("Nordrhein-Westfalen", "medium", &["energy", "innovation"], 50_000, 1_000_000);
    let result = names(&catalog, &q, &MatchOptions { max_results: None }).unwrap();
    assert_eq!(result, vec!["ZIM Einzelprojekt", "Energieeffizienz NRW"]);
}

//! Integration tests for the SafeRoute library

use std::fs;
use std::path::Path;
use std::sync::Arc;

use saferoute::analytics::ZoneStatus;
use saferoute::{
    DatasetCache, DirectionsProvider, GraphSource, OfflineGraphProvider, QueryPoint, RankedResult,
    RouteOutcome, RouteProvider, SafeRouteConfig, SafeRouteError, SafetyNavigator,
};
use tempfile::TempDir;

const STATIONS_CSV: &str = "nm_pol,area,lat,long,risk_score,risk_level\n\
Parliament Street,New Delhi,28.6300,77.2100,0.92,High\n\
Tilak Marg,New Delhi,28.6280,77.2140,0.18,Low\n\
Barakhamba Road,New Delhi,28.6310,77.2250,0.47,Medium\n\
Mussoorie,Dehradun,30.4598,78.0644,0.04,Very Low\n";

/// Walkable streets linking Parliament Street to Tilak Marg
const STREETS_JSON: &str = r#"{
    "elements": [
        {"type": "node", "id": 1, "lat": 28.6300, "lon": 77.2100},
        {"type": "node", "id": 2, "lat": 28.6300, "lon": 77.2120},
        {"type": "node", "id": 3, "lat": 28.6280, "lon": 77.2120},
        {"type": "node", "id": 4, "lat": 28.6280, "lon": 77.2140},
        {"type": "way", "id": 10, "nodes": [1, 2], "tags": {"highway": "residential"}},
        {"type": "way", "id": 11, "nodes": [2, 3, 4], "tags": {"highway": "footway"}}
    ]
}"#;

fn write_fixture(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn offline(path: &Path) -> RouteProvider {
    OfflineGraphProvider::new(GraphSource::File(path.to_path_buf())).into()
}

#[tokio::test]
async fn test_plan_routes_to_nearest_safe_station() {
    let dir = TempDir::new().unwrap();
    let csv = write_fixture(&dir, "stations.csv", STATIONS_CSV);
    let streets = write_fixture(&dir, "streets.json", STREETS_JSON);

    let cache = DatasetCache::new();
    let navigator = SafetyNavigator::new(cache.load(&csv).unwrap());

    let plan = navigator
        .plan(QueryPoint::new(28.6301, 77.2099), &offline(&streets))
        .await
        .unwrap();

    assert_eq!(plan.assessment.nearest.name(), "Parliament Street");
    assert_eq!(plan.assessment.status, ZoneStatus::HighRisk);

    let safe: Vec<&str> = plan.safe_locations.iter().map(RankedResult::name).collect();
    assert_eq!(safe, ["Tilak Marg", "Mussoorie"]);

    let path = plan.route.path().expect("route should be found");
    assert_eq!(path.first(), Some((28.6300, 77.2100)));
    assert_eq!(path.last(), Some((28.6280, 77.2140)));
    assert_eq!(path.len(), 4);
    assert_eq!(plan.route.message(), "Route generated successfully!");
}

#[tokio::test]
async fn test_plan_without_street_data_reports_failure() {
    let dir = TempDir::new().unwrap();
    let csv = write_fixture(&dir, "stations.csv", STATIONS_CSV);
    let streets = write_fixture(&dir, "streets.json", r#"{"elements": []}"#);

    let navigator = SafetyNavigator::new(DatasetCache::new().load(&csv).unwrap());
    let plan = navigator
        .plan(QueryPoint::new(28.6301, 77.2099), &offline(&streets))
        .await
        .unwrap();

    match &plan.route {
        RouteOutcome::Failed { reason } => assert!(reason.contains("3000 m")),
        other => panic!("expected a failed route, got {other:?}"),
    }
    assert_eq!(plan.route.message(), "Failed to generate route.");
    assert_eq!(plan.destination().map(RankedResult::name), Some("Tilak Marg"));
}

#[tokio::test]
async fn test_directions_without_token_leaves_route_unavailable() {
    let dir = TempDir::new().unwrap();
    let csv = write_fixture(&dir, "stations.csv", STATIONS_CSV);

    let navigator = SafetyNavigator::new(DatasetCache::new().load(&csv).unwrap());
    let provider: RouteProvider = DirectionsProvider::new(Some(String::new())).into();
    let plan = navigator
        .plan(QueryPoint::new(28.6285, 77.2135), &provider)
        .await
        .unwrap();

    assert_eq!(plan.assessment.status, ZoneStatus::Safer);
    assert_eq!(plan.route, RouteOutcome::Unavailable);
}

#[tokio::test]
async fn test_configured_stack_end_to_end() {
    let dir = TempDir::new().unwrap();
    let csv = write_fixture(&dir, "stations.csv", STATIONS_CSV);
    let streets = write_fixture(&dir, "streets.json", STREETS_JSON);
    let config_file = write_fixture(
        &dir,
        "config.toml",
        &format!(
            "[dataset]\npath = '{}'\nreload_on_change = true\n\n\
             [routing]\ngraph_file = '{}'\nradius_m = 2000\n\n\
             [defaults]\ntop_n = 1\n",
            csv.display(),
            streets.display()
        ),
    );

    let config = SafeRouteConfig::load_from_path(Some(config_file)).unwrap();
    let cache = DatasetCache::from_config(&config.dataset);
    let navigator = SafetyNavigator::from_config(&config, &cache).unwrap();
    let provider: RouteProvider = OfflineGraphProvider::from_config(&config.routing).into();

    let plan = navigator
        .plan(QueryPoint::new(28.6301, 77.2099), &provider)
        .await
        .unwrap();
    assert_eq!(plan.safe_locations.len(), 1);
    assert!(plan.route.is_found());

    let again = SafetyNavigator::from_config(&config, &cache).unwrap();
    assert!(Arc::ptr_eq(navigator.dataset(), again.dataset()));

    let summary = navigator.summary();
    assert_eq!(summary.total, 4);
    assert_eq!(summary.low_or_very_low(), 2);
    assert_eq!(navigator.top_unsafe(1)[0].name, "Parliament Street");
    assert_eq!(navigator.top_safe(1)[0].name, "Mussoorie");
}

#[test]
fn test_missing_column_is_reported_by_name() {
    let dir = TempDir::new().unwrap();
    let csv = write_fixture(
        &dir,
        "stations.csv",
        "nm_pol,area,lat,long,risk_score\nA,x,28.6,77.2,0.5\n",
    );

    let err = DatasetCache::new().load(&csv).unwrap_err();
    assert!(matches!(err, SafeRouteError::DataValidation { .. }));
    assert_eq!(err.missing(), ["risk_level"]);
}

//! Offline walking routes over an OpenStreetMap street graph.
//!
//! Street data around the origin comes from the Overpass API or from a
//! previously downloaded Overpass JSON document. The ways are turned into an
//! undirected petgraph weighted by segment length in metres, origin and
//! destination are snapped to their nearest nodes, and A* (with a great-circle
//! heuristic) finds the shortest path.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use ordered_float::OrderedFloat;
use petgraph::algo::astar;
use petgraph::graph::{NodeIndex, UnGraph};
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

use super::error::{Result, RoutingError};
use crate::config::RoutingConfig;
use crate::distance::distance_m;
use crate::models::RoutePath;

/// Overpass API URL.
pub const OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Radius of street data fetched around the origin, in metres.
pub const DEFAULT_RADIUS_M: u32 = 3000;

/// Default bound on fetching street data.
pub const DEFAULT_GRAPH_TIMEOUT: Duration = Duration::from_secs(60);

/// Highway values that are never walkable (matched as substrings, as Overpass `!~` does)
const EXCLUDED_HIGHWAYS: [&str; 11] = [
    "abandoned",
    "bus_guideway",
    "construction",
    "cycleway",
    "motor",
    "no",
    "planned",
    "platform",
    "proposed",
    "raceway",
    "razed",
];

/// Where street data comes from
#[derive(Debug, Clone, PartialEq)]
pub enum GraphSource {
    /// Query an Overpass API endpoint around the origin
    Overpass { url: String },
    /// Read an Overpass JSON document from disk
    File(PathBuf),
}

impl Default for GraphSource {
    fn default() -> Self {
        GraphSource::Overpass {
            url: OVERPASS_URL.to_string(),
        }
    }
}

/// Route provider that builds a local walking graph for every request
#[derive(Debug, Clone)]
pub struct OfflineGraphProvider {
    source: GraphSource,
    radius_m: u32,
    timeout: Duration,
}

impl Default for OfflineGraphProvider {
    fn default() -> Self {
        Self::new(GraphSource::default())
    }
}

impl OfflineGraphProvider {
    #[must_use]
    pub fn new(source: GraphSource) -> Self {
        Self {
            source,
            radius_m: DEFAULT_RADIUS_M,
            timeout: DEFAULT_GRAPH_TIMEOUT,
        }
    }

    /// Provider configured from the `[routing]` settings
    #[must_use]
    pub fn from_config(config: &RoutingConfig) -> Self {
        let source = match &config.graph_file {
            Some(path) => GraphSource::File(path.clone()),
            None => GraphSource::Overpass {
                url: config.overpass_url.clone(),
            },
        };
        Self {
            source,
            radius_m: config.radius_m,
            timeout: Duration::from_secs(config.graph_timeout_seconds),
        }
    }

    #[must_use]
    pub fn with_radius_m(mut self, radius_m: u32) -> Self {
        self.radius_m = radius_m;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn radius_m(&self) -> u32 {
        self.radius_m
    }

    #[must_use]
    pub fn source(&self) -> &GraphSource {
        &self.source
    }

    /// Shortest walking path from origin to destination.
    ///
    /// # Errors
    ///
    /// Fails when street data cannot be obtained, when no walkable street lies
    /// within the radius, or when the snapped nodes are not connected.
    #[instrument(name = "offline_route", level = "debug", skip(self))]
    pub async fn route(
        &self,
        origin_lat: f64,
        origin_lon: f64,
        dest_lat: f64,
        dest_lon: f64,
    ) -> Result<RoutePath> {
        let osm = self.fetch(origin_lat, origin_lon).await?;
        let graph = StreetGraph::build(&osm, (origin_lat, origin_lon), self.radius_m)?;
        graph.shortest_path((origin_lat, origin_lon), (dest_lat, dest_lon))
    }

    async fn fetch(&self, lat: f64, lon: f64) -> Result<OverpassResponse> {
        match &self.source {
            GraphSource::File(path) => {
                debug!("Reading street data from {:?}", path);
                let data = tokio::fs::read_to_string(path).await?;
                Ok(serde_json::from_str(&data)?)
            }
            GraphSource::Overpass { url } => self.fetch_overpass(url, lat, lon).await,
        }
    }

    async fn fetch_overpass(&self, url: &str, lat: f64, lon: f64) -> Result<OverpassResponse> {
        let query = walk_query(lat, lon, self.radius_m, self.timeout.as_secs());
        debug!("Overpass query:\n{}", query);

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("saferoute/", env!("CARGO_PKG_VERSION")))
            .build()?;

        info!(
            "Requesting walkable streets within {} m of ({:.4}, {:.4})",
            self.radius_m, lat, lon
        );

        let response = client
            .post(url)
            .body(query)
            .header("Content-Type", "text/plain")
            .send()
            .await
            .map_err(|e| {
                error!("Overpass request failed: {}", e);
                self.map_request_error(e)
            })?;

        if !response.status().is_success() {
            return Err(RoutingError::Network(format!(
                "Overpass API returned status {}",
                response.status()
            )));
        }

        let osm: OverpassResponse = response.json().await.map_err(|e| self.map_request_error(e))?;
        info!("Downloaded {} OSM elements", osm.elements.len());
        Ok(osm)
    }

    fn map_request_error(&self, err: reqwest::Error) -> RoutingError {
        if err.is_timeout() {
            RoutingError::Timeout(self.timeout.as_secs())
        } else {
            err.into()
        }
    }
}

/// Overpass QL selecting walkable ways around a point
fn walk_query(lat: f64, lon: f64, radius_m: u32, timeout_s: u64) -> String {
    format!(
        r#"[out:json][timeout:{timeout_s}];
(
  way["highway"]["area"!~"yes"]["access"!~"private"]["highway"!~"{excluded}"]["foot"!~"no"]["service"!~"private"]
    (around:{radius_m},{lat},{lon});
);
(._;>;);
out body;"#,
        excluded = EXCLUDED_HIGHWAYS.join("|"),
    )
}

/// Node data in the street graph.
#[derive(Debug, Clone, Copy)]
struct NodeData {
    lat: f64,
    lon: f64,
}

/// Undirected walking graph with edge weights in metres
#[derive(Debug)]
struct StreetGraph {
    graph: UnGraph<NodeData, f64>,
    osm_to_node: HashMap<i64, NodeIndex>,
}

impl StreetGraph {
    /// Build the walking graph from Overpass elements, keeping only way
    /// segments whose endpoints lie within `radius_m` of `center`.
    fn build(osm: &OverpassResponse, center: (f64, f64), radius_m: u32) -> Result<Self> {
        let radius = f64::from(radius_m);

        // First pass: collect all nodes inside the radius
        let mut nodes: HashMap<i64, (f64, f64)> = HashMap::new();
        for elem in &osm.elements {
            if elem.elem_type == "node" {
                if let (Some(lat), Some(lon)) = (elem.lat, elem.lon) {
                    if distance_m(center.0, center.1, lat, lon) <= radius {
                        nodes.insert(elem.id, (lat, lon));
                    }
                }
            }
        }

        let mut street_graph = Self {
            graph: UnGraph::new_undirected(),
            osm_to_node: HashMap::new(),
        };

        // Second pass: connect consecutive nodes of walkable ways
        let mut way_count = 0;
        for elem in &osm.elements {
            if elem.elem_type != "way" || !elem.tags.as_ref().is_some_and(OsmTags::is_walkable) {
                continue;
            }
            let Some(node_ids) = &elem.nodes else {
                continue;
            };

            for window in node_ids.windows(2) {
                let (Some(&(lat1, lon1)), Some(&(lat2, lon2))) =
                    (nodes.get(&window[0]), nodes.get(&window[1]))
                else {
                    continue;
                };

                let a = street_graph.get_or_create_node(window[0], lat1, lon1);
                let b = street_graph.get_or_create_node(window[1], lat2, lon2);
                if a != b {
                    street_graph
                        .graph
                        .add_edge(a, b, distance_m(lat1, lon1, lat2, lon2));
                }
            }
            way_count += 1;
        }

        info!(
            "Built street graph with {} nodes and {} edges from {} ways",
            street_graph.graph.node_count(),
            street_graph.graph.edge_count(),
            way_count
        );

        if street_graph.graph.edge_count() == 0 {
            return Err(RoutingError::EmptyGraph { radius_m });
        }

        Ok(street_graph)
    }

    fn get_or_create_node(&mut self, osm_id: i64, lat: f64, lon: f64) -> NodeIndex {
        if let Some(&idx) = self.osm_to_node.get(&osm_id) {
            idx
        } else {
            let idx = self.graph.add_node(NodeData { lat, lon });
            self.osm_to_node.insert(osm_id, idx);
            idx
        }
    }

    /// Nearest graph node to the given coordinates; the earliest node wins ties
    fn snap(&self, lat: f64, lon: f64) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .min_by_key(|&idx| {
                let node = self.graph[idx];
                OrderedFloat(distance_m(lat, lon, node.lat, node.lon))
            })
    }

    fn shortest_path(&self, from: (f64, f64), to: (f64, f64)) -> Result<RoutePath> {
        let start = self.snap(from.0, from.1).ok_or(RoutingError::NoPath)?;
        let end = self.snap(to.0, to.1).ok_or(RoutingError::NoPath)?;
        let goal = self.graph[end];

        let (length_m, path) = astar(
            &self.graph,
            start,
            |n| n == end,
            |e| *e.weight(),
            |n| {
                let node = self.graph[n];
                distance_m(node.lat, node.lon, goal.lat, goal.lon)
            },
        )
        .ok_or(RoutingError::NoPath)?;

        debug!("Found path of {} nodes, {:.0} m", path.len(), length_m);

        Ok(RoutePath::new(
            path.iter()
                .map(|&idx| {
                    let node = self.graph[idx];
                    (node.lat, node.lon)
                })
                .collect(),
        ))
    }
}

#[cfg(test)]
impl StreetGraph {
    fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

// ============================================================================
// OSM Data Structures (Overpass API)
// ============================================================================

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    elements: Vec<OsmElement>,
}

#[derive(Debug, Deserialize)]
struct OsmElement {
    #[serde(rename = "type")]
    elem_type: String,
    id: i64,
    lat: Option<f64>,
    lon: Option<f64>,
    nodes: Option<Vec<i64>>,
    tags: Option<OsmTags>,
}

#[derive(Debug, Default, Deserialize)]
struct OsmTags {
    highway: Option<String>,
    area: Option<String>,
    access: Option<String>,
    foot: Option<String>,
    service: Option<String>,
}

impl OsmTags {
    /// Same filter as the Overpass walk query, for documents read from disk
    fn is_walkable(&self) -> bool {
        let Some(highway) = self.highway.as_deref() else {
            return false;
        };
        let is = |tag: &Option<String>, value: &str| tag.as_deref().is_some_and(|t| t.contains(value));

        !EXCLUDED_HIGHWAYS.iter().any(|excluded| highway.contains(excluded))
            && !is(&self.area, "yes")
            && !is(&self.access, "private")
            && !is(&self.foot, "no")
            && !is(&self.service, "private")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Small street grid near Connaught Place:
    ///
    /// ```text
    /// 1 -- 2 -- 3
    ///      |
    ///      4 -- 5      6 == 7 (motorway)
    /// ```
    const GRID: &str = r#"{
        "elements": [
            {"type": "node", "id": 1, "lat": 28.6300, "lon": 77.2100},
            {"type": "node", "id": 2, "lat": 28.6300, "lon": 77.2120},
            {"type": "node", "id": 3, "lat": 28.6300, "lon": 77.2140},
            {"type": "node", "id": 4, "lat": 28.6280, "lon": 77.2120},
            {"type": "node", "id": 5, "lat": 28.6280, "lon": 77.2140},
            {"type": "node", "id": 6, "lat": 28.6250, "lon": 77.2100},
            {"type": "node", "id": 7, "lat": 28.6250, "lon": 77.2140},
            {"type": "way", "id": 100, "nodes": [1, 2, 3], "tags": {"highway": "residential"}},
            {"type": "way", "id": 101, "nodes": [2, 4, 5], "tags": {"highway": "footway"}},
            {"type": "way", "id": 102, "nodes": [6, 7], "tags": {"highway": "motorway"}}
        ]
    }"#;

    fn grid() -> OverpassResponse {
        serde_json::from_str(GRID).unwrap()
    }

    #[test]
    fn test_build_skips_unwalkable_ways() {
        let graph = StreetGraph::build(&grid(), (28.63, 77.21), DEFAULT_RADIUS_M).unwrap();
        assert_eq!(graph.node_count(), 5);
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn test_shortest_path_follows_streets() {
        let graph = StreetGraph::build(&grid(), (28.63, 77.21), DEFAULT_RADIUS_M).unwrap();
        let path = graph
            .shortest_path((28.6301, 77.2099), (28.6279, 77.2141))
            .unwrap();

        assert_eq!(
            path.points(),
            [
                (28.6300, 77.2100),
                (28.6300, 77.2120),
                (28.6280, 77.2120),
                (28.6280, 77.2140),
            ]
        );
    }

    #[test]
    fn test_same_snapped_node_gives_single_point() {
        let graph = StreetGraph::build(&grid(), (28.63, 77.21), DEFAULT_RADIUS_M).unwrap();
        let path = graph
            .shortest_path((28.63001, 77.21001), (28.62999, 77.20999))
            .unwrap();
        assert_eq!(path.points(), [(28.6300, 77.2100)]);
    }

    #[test]
    fn test_no_streets_in_radius_is_empty_graph() {
        let err = StreetGraph::build(&grid(), (30.0, 79.0), DEFAULT_RADIUS_M).unwrap_err();
        assert!(matches!(err, RoutingError::EmptyGraph { radius_m: 3000 }));
    }

    #[test]
    fn test_disconnected_components_have_no_path() {
        let json = r#"{
            "elements": [
                {"type": "node", "id": 1, "lat": 10.000, "lon": 10.000},
                {"type": "node", "id": 2, "lat": 10.001, "lon": 10.000},
                {"type": "node", "id": 3, "lat": 10.000, "lon": 10.005},
                {"type": "node", "id": 4, "lat": 10.001, "lon": 10.005},
                {"type": "way", "id": 10, "nodes": [1, 2], "tags": {"highway": "path"}},
                {"type": "way", "id": 11, "nodes": [3, 4], "tags": {"highway": "path"}}
            ]
        }"#;
        let osm: OverpassResponse = serde_json::from_str(json).unwrap();
        let graph = StreetGraph::build(&osm, (10.0, 10.0), DEFAULT_RADIUS_M).unwrap();
        let err = graph.shortest_path((10.0, 10.0), (10.001, 10.005)).unwrap_err();
        assert!(matches!(err, RoutingError::NoPath));
    }

    #[test]
    fn test_walkable_filter() {
        let tags = |highway: &str| OsmTags {
            highway: Some(highway.to_string()),
            ..OsmTags::default()
        };
        assert!(tags("residential").is_walkable());
        assert!(tags("footway").is_walkable());
        assert!(!tags("motorway_link").is_walkable());
        assert!(!tags("cycleway").is_walkable());
        assert!(!OsmTags::default().is_walkable());

        let private = OsmTags {
            access: Some("private".to_string()),
            ..tags("service")
        };
        assert!(!private.is_walkable());
    }

    #[test]
    fn test_walk_query_is_bounded_around_origin() {
        let query = walk_query(28.6139, 77.209, 3000, 60);
        assert!(query.starts_with("[out:json][timeout:60];"));
        assert!(query.contains("(around:3000,28.6139,77.209)"));
        assert!(query.contains("abandoned|bus_guideway"));
    }

    #[tokio::test]
    async fn test_provider_routes_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(GRID.as_bytes()).unwrap();

        let provider = OfflineGraphProvider::new(GraphSource::File(file.path().to_path_buf()));
        let path = provider
            .route(28.6301, 77.2099, 28.6301, 77.2141)
            .await
            .unwrap();
        assert_eq!(path.first(), Some((28.6300, 77.2100)));
        assert_eq!(path.last(), Some((28.6300, 77.2140)));
        assert_eq!(path.len(), 3);
    }

    #[tokio::test]
    async fn test_provider_without_street_data_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(GRID.as_bytes()).unwrap();

        let provider = OfflineGraphProvider::new(GraphSource::File(file.path().to_path_buf()))
            .with_radius_m(500);
        let err = provider.route(30.0, 79.0, 30.01, 79.01).await.unwrap_err();
        assert!(matches!(err, RoutingError::EmptyGraph { radius_m: 500 }));
    }

    #[tokio::test]
    async fn test_provider_reports_unreadable_file() {
        let provider = OfflineGraphProvider::new(GraphSource::File("/nonexistent/osm.json".into()));
        let err = provider.route(0.0, 0.0, 0.0, 0.0).await.unwrap_err();
        assert!(matches!(err, RoutingError::Io(_)));
    }
}

use std::{fmt, path::PathBuf, str::FromStr};

use geojson::{FeatureCollection, GeoJson, Value};
use percorsi_shared::Coordinate;

use crate::{error::NetworkLoadError, geo::haversine_m};

/// Where the road geometry is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkSource {
    Path(PathBuf),
    Url(String),
}

impl FromStr for NetworkSource {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with("http://") || s.starts_with("https://") {
            Ok(NetworkSource::Url(s.to_string()))
        } else {
            Ok(NetworkSource::Path(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for NetworkSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkSource::Path(path) => write!(f, "{}", path.display()),
            NetworkSource::Url(url) => f.write_str(url),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SegmentGeometry {
    LineString(Vec<Coordinate>),
    /// Any other geometry type; kept for display but never snapped to.
    Other(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoadSegment {
    pub name: Option<String>,
    pub geometry: SegmentGeometry,
}

impl RoadSegment {
    pub fn vertices(&self) -> &[Coordinate] {
        match &self.geometry {
            SegmentGeometry::LineString(coords) => coords,
            SegmentGeometry::Other(_) => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoadNetwork {
    collection: FeatureCollection,
    segments: Vec<RoadSegment>,
}

impl RoadNetwork {
    pub fn from_geojson_str(input: &str) -> Result<Self, NetworkLoadError> {
        match input.parse::<GeoJson>()? {
            GeoJson::FeatureCollection(collection) => Ok(Self::from_feature_collection(collection)),
            _ => Err(NetworkLoadError::NotAFeatureCollection),
        }
    }

    pub fn from_feature_collection(collection: FeatureCollection) -> Self {
        let segments = collection
            .features
            .iter()
            .filter_map(|feature| {
                let geometry = feature.geometry.as_ref()?;
                let name = feature
                    .properties
                    .as_ref()
                    .and_then(|props| props.get("name").or_else(|| props.get("nome")))
                    .and_then(|value| value.as_str())
                    .map(str::to_string);
                let geometry = match &geometry.value {
                    Value::LineString(positions) => SegmentGeometry::LineString(
                        positions
                            .iter()
                            .filter_map(|position| Coordinate::from_position(position))
                            .collect(),
                    ),
                    other => SegmentGeometry::Other(geometry_kind(other)),
                };
                Some(RoadSegment { name, geometry })
            })
            .collect();

        Self {
            collection,
            segments,
        }
    }

    pub fn collection(&self) -> &FeatureCollection {
        &self.collection
    }

    pub fn segments(&self) -> &[RoadSegment] {
        &self.segments
    }

    /// Every snappable vertex, in file order.
    pub fn vertices(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.segments
            .iter()
            .flat_map(|segment| segment.vertices().iter().copied())
    }
}

fn geometry_kind(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

/// Nearest-vertex lookup over the road network.
///
/// An index without a network snaps every point to itself, which is what the
/// map falls back to when the road data could not be loaded.
#[derive(Debug, Clone, Default)]
pub struct RoadNetworkIndex {
    network: Option<RoadNetwork>,
}

impl RoadNetworkIndex {
    pub fn new(network: RoadNetwork) -> Self {
        Self {
            network: Some(network),
        }
    }

    pub fn passthrough() -> Self {
        Self::default()
    }

    pub async fn load(
        source: &NetworkSource,
        http: &reqwest::Client,
    ) -> Result<Self, NetworkLoadError> {
        let body = match source {
            NetworkSource::Path(path) => tokio::fs::read_to_string(path).await?,
            NetworkSource::Url(url) => {
                http.get(url)
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?
            }
        };
        let network = RoadNetwork::from_geojson_str(&body)?;
        tracing::info!(
            "loaded road network from {source}: {} segments, {} snappable vertices",
            network.segments().len(),
            network.vertices().count()
        );
        Ok(Self::new(network))
    }

    pub async fn load_or_passthrough(source: &NetworkSource, http: &reqwest::Client) -> Self {
        match Self::load(source, http).await {
            Ok(index) => index,
            Err(err) => {
                tracing::warn!("road network unavailable ({source}): {err}; snapping disabled");
                Self::passthrough()
            }
        }
    }

    pub fn network(&self) -> Option<&RoadNetwork> {
        self.network.as_ref()
    }

    pub fn vertex_count(&self) -> usize {
        self.network
            .as_ref()
            .map_or(0, |network| network.vertices().count())
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count() == 0
    }

    /// Closest LineString vertex to `point`; the first one wins exact ties.
    /// Returns `point` itself when there is nothing to snap to.
    pub fn nearest(&self, point: Coordinate) -> Coordinate {
        let Some(network) = &self.network else {
            return point;
        };

        let mut closest = None;
        let mut min_dist = f64::INFINITY;
        for vertex in network.vertices() {
            let dist = haversine_m(point, vertex);
            if dist < min_dist {
                min_dist = dist;
                closest = Some(vertex);
            }
        }
        closest.unwrap_or(point)
    }
}

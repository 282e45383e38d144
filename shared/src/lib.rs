use std::{fmt, str::FromStr};

use geojson::{FeatureCollection, Geometry, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Builds a coordinate from a GeoJSON position (`[lon, lat, ...]`).
    pub fn from_position(position: &[f64]) -> Option<Self> {
        match position {
            [lon, lat, ..] => Some(Self {
                lat: *lat,
                lon: *lon,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lon)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Bounds {
    pub fn around(coord: Coordinate) -> Self {
        Self {
            min_lat: coord.lat,
            max_lat: coord.lat,
            min_lon: coord.lon,
            max_lon: coord.lon,
        }
    }

    pub fn extend(&mut self, coord: Coordinate) {
        self.min_lat = self.min_lat.min(coord.lat);
        self.max_lat = self.max_lat.max(coord.lat);
        self.min_lon = self.min_lon.min(coord.lon);
        self.max_lon = self.max_lon.max(coord.lon);
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            min_lat: self.min_lat.min(other.min_lat),
            max_lat: self.max_lat.max(other.max_lat),
            min_lon: self.min_lon.min(other.min_lon),
            max_lon: self.max_lon.max(other.max_lon),
        }
    }

    pub fn contains(&self, coord: Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&coord.lat)
            && (self.min_lon..=self.max_lon).contains(&coord.lon)
    }

    /// Smallest box holding every coordinate, `None` for an empty iterator.
    pub fn from_coords(coords: impl IntoIterator<Item = Coordinate>) -> Option<Self> {
        let mut coords = coords.into_iter();
        let mut bounds = Self::around(coords.next()?);
        for coord in coords {
            bounds.extend(coord);
        }
        Some(bounds)
    }

    /// Bounds of every position found in the collection's geometries.
    pub fn from_feature_collection(collection: &FeatureCollection) -> Option<Self> {
        let mut coords = Vec::new();
        for feature in &collection.features {
            if let Some(geometry) = &feature.geometry {
                collect_positions(geometry, &mut coords);
            }
        }
        Self::from_coords(coords)
    }
}

fn collect_positions(geometry: &Geometry, out: &mut Vec<Coordinate>) {
    let mut push = |position: &Vec<f64>| {
        if let Some(coord) = Coordinate::from_position(position) {
            out.push(coord);
        }
    };
    match &geometry.value {
        Value::Point(position) => push(position),
        Value::MultiPoint(positions) | Value::LineString(positions) => {
            positions.iter().for_each(push)
        }
        Value::MultiLineString(lines) | Value::Polygon(lines) => {
            lines.iter().flatten().for_each(push)
        }
        Value::MultiPolygon(polygons) => polygons.iter().flatten().flatten().for_each(push),
        Value::GeometryCollection(geometries) => {
            for inner in geometries {
                collect_positions(inner, out);
            }
        }
    }
}

/// Which of the two computed walks a request or a layer refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathType {
    /// Sun-exposed walk.
    Sole,
    /// Shaded walk.
    Ombra,
}

impl PathType {
    pub const ALL: [PathType; 2] = [PathType::Sole, PathType::Ombra];

    pub fn as_str(self) -> &'static str {
        match self {
            PathType::Sole => "sole",
            PathType::Ombra => "ombra",
        }
    }
}

impl fmt::Display for PathType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown path type `{0}` (expected `sole` or `ombra`)")]
pub struct UnknownPathType(pub String);

impl FromStr for PathType {
    type Err = UnknownPathType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sole" => Ok(PathType::Sole),
            "ombra" => Ok(PathType::Ombra),
            other => Err(UnknownPathType(other.to_string())),
        }
    }
}

/// Optional values picked in the UI next to the map. Absent values are left
/// for the routing backend to default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stagione: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fascia: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tipo: Option<PathType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteQuery {
    pub start: Coordinate,
    pub end: Coordinate,
    pub filters: RouteFilters,
}

/// JSON body of `POST /percorsi`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePayload {
    pub start_lon: f64,
    pub start_lat: f64,
    pub end_lon: f64,
    pub end_lat: f64,
    #[serde(flatten)]
    pub filters: RouteFilters,
}

impl From<&RouteQuery> for RoutePayload {
    fn from(query: &RouteQuery) -> Self {
        Self {
            start_lon: query.start.lon,
            start_lat: query.start.lat,
            end_lon: query.end.lon,
            end_lat: query.end.lat,
            filters: query.filters.clone(),
        }
    }
}

/// Response body of `POST /percorsi`. Either path may be missing or `null`
/// when the backend found nothing for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sole: Option<FeatureCollection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ombra: Option<FeatureCollection>,
}

impl RouteResult {
    pub fn path(&self, kind: PathType) -> Option<&FeatureCollection> {
        match kind {
            PathType::Sole => self.sole.as_ref(),
            PathType::Ombra => self.ombra.as_ref(),
        }
    }

    /// The collection for `kind` if it holds at least one feature.
    pub fn non_empty_path(&self, kind: PathType) -> Option<&FeatureCollection> {
        self.path(kind).filter(|fc| !fc.features.is_empty())
    }
}

use thiserror::Error;

/// The road network could not be obtained. Never surfaced to the user:
/// snapping falls back to passthrough instead.
#[derive(Debug, Error)]
pub enum NetworkLoadError {
    #[error("failed to read road network file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to fetch road network: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("invalid road network GeoJSON: {0}")]
    Parse(#[from] geojson::Error),
    #[error("road network is not a FeatureCollection")]
    NotAFeatureCollection,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("backend answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("undecodable response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("both endpoints must be selected before requesting a route")]
    MissingEndpoints,
    #[error("route computation failed: {0}")]
    Transport(#[from] TransportError),
    #[error("no path found for the requested type")]
    NoRouteFound,
}

//! Drives the client logic without a browser: two clicks, one route request,
//! and a summary of what ended up on the map.

use percorsi_client::{
    ClientConfig, HeadlessMapView, RoadNetworkIndex, RouteOutcome, RouteRequestClient, Session,
    geo::haversine_m,
    shared::{Bounds, Coordinate, RouteFilters},
    view::DrawnLayer,
};
use serde::Serialize;

use crate::error::HeadlessError;

#[derive(Debug, Clone, Serialize)]
pub struct SnapReport {
    pub input: Coordinate,
    pub snapped: Coordinate,
    pub distance_m: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayerReport {
    pub color: &'static str,
    pub features: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteReport {
    pub start: Coordinate,
    pub end: Coordinate,
    pub layers: Vec<LayerReport>,
    pub bounds: Option<Bounds>,
    pub notices: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn load_index(
    config: &ClientConfig,
) -> Result<(RoadNetworkIndex, RouteRequestClient), HeadlessError> {
    let client = RouteRequestClient::new(config)?;
    let index = RoadNetworkIndex::load_or_passthrough(&config.network_source, client.http()).await;
    Ok((index, client))
}

pub async fn snap(config: &ClientConfig, point: Coordinate) -> Result<SnapReport, HeadlessError> {
    let (index, _) = load_index(config).await?;
    let snapped = index.nearest(point);
    Ok(SnapReport {
        input: point,
        snapped,
        distance_m: haversine_m(point, snapped),
    })
}

/// Clicks `start` then `end`, requests a route with `filters` and reports the
/// route layers left on the map.
pub async fn plan_route(
    config: &ClientConfig,
    start: Coordinate,
    end: Coordinate,
    filters: RouteFilters,
) -> Result<RouteReport, HeadlessError> {
    let (index, client) = load_index(config).await?;
    let mut session = Session::new(index, config.render_policy);
    let mut view = HeadlessMapView::new();

    session.show_road_network(&mut view);
    session.on_click(start, &mut view);
    session.on_click(end, &mut view);
    let (snapped_start, snapped_end) = session
        .selection()
        .endpoints()
        .unwrap_or((start, end));

    let outcome = session.request_route(&client, filters, &mut view).await;
    let error = outcome.as_ref().err().map(ToString::to_string);

    let layers = session
        .renderer()
        .drawn()
        .iter()
        .filter_map(|(_, id)| match view.layer(*id)? {
            DrawnLayer::GeoJson { features, style, .. } => Some(LayerReport {
                color: style.color,
                features: *features,
            }),
            _ => None,
        })
        .collect();
    let bounds = match &outcome {
        Ok(RouteOutcome::Rendered(rendered)) => rendered.bounds,
        _ => None,
    };

    Ok(RouteReport {
        start: snapped_start,
        end: snapped_end,
        layers,
        bounds,
        notices: view.notices().iter().map(ToString::to_string).collect(),
        error,
    })
}

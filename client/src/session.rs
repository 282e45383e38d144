use percorsi_shared::{Coordinate, RouteFilters, RouteQuery, RouteResult};

use crate::{
    error::{RouteError, TransportError},
    network::RoadNetworkIndex,
    render::{RenderPolicy, Rendered, RouteRenderer},
    request::RoutingBackend,
    selection::{ClickOutcome, SelectionState, SelectionStateMachine},
    view::{LayerId, LayerStyle, MapView, Notice},
};

/// A query issued by [`Session::begin_route`], stamped with the generation
/// it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteTicket {
    generation: u64,
    query: RouteQuery,
}

impl RouteTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn query(&self) -> &RouteQuery {
        &self.query
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RouteOutcome {
    Rendered(Rendered),
    /// The selection was reset or a newer query was issued while this one
    /// was in flight; nothing on the map was touched.
    Discarded,
}

/// Everything one map page owns: the road index, the two-point selection,
/// the drawn route layers and the generation counter that retires in-flight
/// queries.
#[derive(Debug)]
pub struct Session {
    index: RoadNetworkIndex,
    selection: SelectionStateMachine,
    renderer: RouteRenderer,
    network_layer: Option<LayerId>,
    generation: u64,
}

impl Session {
    pub fn new(index: RoadNetworkIndex, policy: RenderPolicy) -> Self {
        Self {
            index,
            selection: SelectionStateMachine::new(),
            renderer: RouteRenderer::new(policy),
            network_layer: None,
            generation: 0,
        }
    }

    pub fn index(&self) -> &RoadNetworkIndex {
        &self.index
    }

    pub fn selection(&self) -> &SelectionStateMachine {
        &self.selection
    }

    pub fn renderer(&self) -> &RouteRenderer {
        &self.renderer
    }

    pub fn state(&self) -> SelectionState {
        self.selection.state()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Draws the loaded road network underneath everything else. No-op when
    /// the network is missing or already shown.
    pub fn show_road_network(&mut self, view: &mut impl MapView) -> Option<LayerId> {
        if self.network_layer.is_none() {
            let network = self.index.network()?;
            self.network_layer =
                Some(view.add_geojson(network.collection(), LayerStyle::ROAD_NETWORK));
        }
        self.network_layer
    }

    /// Swaps in a road index that finished loading after the session
    /// started. Later clicks snap to it; endpoints already placed stay where
    /// they are. The previous network layer, if any, is replaced.
    pub fn install_network(
        &mut self,
        index: RoadNetworkIndex,
        view: &mut impl MapView,
    ) -> Option<LayerId> {
        if let Some(layer) = self.network_layer.take() {
            view.remove_layer(layer);
        }
        tracing::info!("road network installed ({} vertices)", index.vertex_count());
        self.index = index;
        self.show_road_network(view)
    }

    pub fn on_click(&mut self, at: Coordinate, view: &mut impl MapView) -> SelectionState {
        match self.selection.on_click(at, &self.index, view) {
            ClickOutcome::Placed(endpoint) => {
                tracing::debug!("{} placed at {}", endpoint.role.label(), endpoint.location);
            }
            ClickOutcome::Reset => {
                self.renderer.clear(view);
                self.generation += 1;
                tracing::debug!("selection reset, generation {}", self.generation);
                view.notify(&Notice::SelectionReset);
            }
        }
        self.selection.state()
    }

    /// Builds the query for the current selection and retires any query
    /// still in flight.
    pub fn begin_route(
        &mut self,
        filters: RouteFilters,
        view: &mut impl MapView,
    ) -> Result<RouteTicket, RouteError> {
        let Some((start, end)) = self.selection.endpoints() else {
            view.notify(&Notice::MissingEndpoints);
            return Err(RouteError::MissingEndpoints);
        };
        self.generation += 1;
        Ok(RouteTicket {
            generation: self.generation,
            query: RouteQuery {
                start,
                end,
                filters,
            },
        })
    }

    /// Applies the answer to `ticket`.
    ///
    /// A transport failure leaves the drawn route alone; an empty answer
    /// clears it. Answers to retired tickets are dropped.
    pub fn complete_route(
        &mut self,
        ticket: &RouteTicket,
        outcome: Result<RouteResult, TransportError>,
        view: &mut impl MapView,
    ) -> Result<RouteOutcome, RouteError> {
        if ticket.generation != self.generation {
            tracing::debug!(
                "dropping stale route response (generation {} != {})",
                ticket.generation,
                self.generation
            );
            return Ok(RouteOutcome::Discarded);
        }

        let result = match outcome {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!("route request failed: {err}");
                view.notify(&Notice::RouteError(err.to_string()));
                return Err(err.into());
            }
        };
        self.renderer
            .render(&result, ticket.query.filters.tipo, view)
            .map(RouteOutcome::Rendered)
    }

    /// `begin_route`, one call to `backend`, then `complete_route`.
    pub async fn request_route<B: RoutingBackend>(
        &mut self,
        backend: &B,
        filters: RouteFilters,
        view: &mut impl MapView,
    ) -> Result<RouteOutcome, RouteError> {
        let ticket = self.begin_route(filters, view)?;
        let outcome = backend.compute(ticket.query()).await;
        self.complete_route(&ticket, outcome, view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        network::{RoadNetwork, tests::SAMPLE_NETWORK},
        view::HeadlessMapView,
    };
    use percorsi_shared::PathType;
    use serde_json::json;

    fn session() -> Session {
        let index = RoadNetworkIndex::new(RoadNetwork::from_geojson_str(SAMPLE_NETWORK).unwrap());
        Session::new(index, RenderPolicy::Filtered)
    }

    fn sole_result() -> RouteResult {
        serde_json::from_value(json!({
            "sole": {
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "properties": {},
                    "geometry": {
                        "type": "LineString",
                        "coordinates": [[14.7900, 40.7700], [14.7910, 40.7720]]
                    }
                }]
            }
        }))
        .unwrap()
    }

    fn sole_filters() -> RouteFilters {
        RouteFilters {
            tipo: Some(PathType::Sole),
            ..RouteFilters::default()
        }
    }

    fn select_two(session: &mut Session, view: &mut HeadlessMapView) {
        session.on_click(Coordinate::new(40.770, 14.790), view);
        session.on_click(Coordinate::new(40.773, 14.792), view);
    }

    #[test]
    fn test_route_requires_both_endpoints() {
        let mut session = session();
        let mut view = HeadlessMapView::new();
        session.on_click(Coordinate::new(40.770, 14.790), &mut view);

        let err = session.begin_route(sole_filters(), &mut view).unwrap_err();

        assert!(matches!(err, RouteError::MissingEndpoints));
        assert_eq!(view.notices(), &[Notice::MissingEndpoints]);
        assert_eq!(session.generation(), 0);
    }

    #[test]
    fn test_three_clicks_close_the_cycle() {
        let mut session = session();
        let mut view = HeadlessMapView::new();
        select_two(&mut session, &mut view);
        let ticket = session.begin_route(sole_filters(), &mut view).unwrap();
        session
            .complete_route(&ticket, Ok(sole_result()), &mut view)
            .unwrap();
        assert_eq!(view.route_layer_count(), 1);

        let state = session.on_click(Coordinate::new(40.771, 14.791), &mut view);

        assert_eq!(state, SelectionState::Empty);
        assert_eq!(view.layer_count(), 0);
        assert_eq!(view.notices().last(), Some(&Notice::SelectionReset));
    }

    #[test]
    fn test_transport_failure_keeps_previous_route() {
        let mut session = session();
        let mut view = HeadlessMapView::new();
        select_two(&mut session, &mut view);
        let first = session.begin_route(sole_filters(), &mut view).unwrap();
        session
            .complete_route(&first, Ok(sole_result()), &mut view)
            .unwrap();

        let second = session.begin_route(sole_filters(), &mut view).unwrap();
        let failure = serde_json::from_str::<RouteResult>("not json").unwrap_err();
        let err = session
            .complete_route(&second, Err(failure.into()), &mut view)
            .unwrap_err();

        assert!(matches!(err, RouteError::Transport(_)));
        assert_eq!(view.route_layer_count(), 1);
        assert!(matches!(
            view.notices().last(),
            Some(Notice::RouteError(detail)) if detail.starts_with("undecodable response")
        ));
    }

    #[test]
    fn test_empty_answer_clears_previous_route() {
        let mut session = session();
        let mut view = HeadlessMapView::new();
        select_two(&mut session, &mut view);
        let first = session.begin_route(sole_filters(), &mut view).unwrap();
        session
            .complete_route(&first, Ok(sole_result()), &mut view)
            .unwrap();

        let second = session.begin_route(sole_filters(), &mut view).unwrap();
        let err = session
            .complete_route(&second, Ok(RouteResult::default()), &mut view)
            .unwrap_err();

        assert!(matches!(err, RouteError::NoRouteFound));
        assert_eq!(view.route_layer_count(), 0);
        assert_eq!(view.notices().last(), Some(&Notice::RouteNotFound));
    }

    #[test]
    fn test_response_after_reset_is_dropped() {
        let mut session = session();
        let mut view = HeadlessMapView::new();
        select_two(&mut session, &mut view);
        let ticket = session.begin_route(sole_filters(), &mut view).unwrap();

        session.on_click(Coordinate::new(40.771, 14.791), &mut view);
        let outcome = session
            .complete_route(&ticket, Ok(sole_result()), &mut view)
            .unwrap();

        assert_eq!(outcome, RouteOutcome::Discarded);
        assert_eq!(view.layer_count(), 0);
    }

    #[test]
    fn test_show_road_network_draws_once() {
        let mut session = session();
        let mut view = HeadlessMapView::new();
        let first = session.show_road_network(&mut view);
        let second = session.show_road_network(&mut view);

        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(view.count_styled(LayerStyle::ROAD_NETWORK), 1);

        let mut bare = Session::new(RoadNetworkIndex::passthrough(), RenderPolicy::All);
        assert!(bare.show_road_network(&mut view).is_none());
    }

    #[test]
    fn test_network_installed_late_snaps_later_clicks() {
        let mut session = Session::new(RoadNetworkIndex::passthrough(), RenderPolicy::Filtered);
        let mut view = HeadlessMapView::new();
        let early = Coordinate::new(40.7701, 14.7899);
        session.on_click(early, &mut view);
        assert_eq!(session.selection().start().unwrap().location, early);

        let index = RoadNetworkIndex::new(RoadNetwork::from_geojson_str(SAMPLE_NETWORK).unwrap());
        let layer = session.install_network(index, &mut view);
        session.on_click(Coordinate::new(40.7731, 14.7921), &mut view);

        assert!(layer.is_some());
        assert_eq!(view.count_styled(LayerStyle::ROAD_NETWORK), 1);
        assert_eq!(session.selection().start().unwrap().location, early);
        assert_eq!(
            session.selection().end().unwrap().location,
            Coordinate::new(40.7730, 14.7920)
        );
    }

    #[test]
    fn test_reinstalling_network_replaces_its_layer() {
        let mut session = session();
        let mut view = HeadlessMapView::new();
        let first = session.show_road_network(&mut view);

        let index = RoadNetworkIndex::new(RoadNetwork::from_geojson_str(SAMPLE_NETWORK).unwrap());
        let second = session.install_network(index, &mut view);

        assert_ne!(first, second);
        assert_eq!(view.count_styled(LayerStyle::ROAD_NETWORK), 1);
    }
}

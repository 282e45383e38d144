use percorsi_shared::{Bounds, Coordinate};

use crate::{
    network::RoadNetworkIndex,
    view::{LayerId, LayerStyle, MapView, Marker},
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EndpointRole {
    Start,
    End,
}

impl EndpointRole {
    pub fn label(self) -> &'static str {
        match self {
            EndpointRole::Start => "Partenza",
            EndpointRole::End => "Arrivo",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Endpoint {
    pub role: EndpointRole,
    pub location: Coordinate,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SelectionState {
    Empty,
    HasStart,
    HasBoth,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ClickOutcome {
    Placed(Endpoint),
    Reset,
}

#[derive(Clone, Copy, Debug)]
struct PlacedEndpoint {
    endpoint: Endpoint,
    marker: LayerId,
}

/// Two-point selection driven by map clicks: the first click places the
/// start, the second the end plus a preview line, the third clears both.
///
/// Markers are draggable on the map but a drag never resnaps nor changes the
/// state; the recorded locations are the snapped click locations.
#[derive(Debug, Default)]
pub struct SelectionStateMachine {
    start: Option<PlacedEndpoint>,
    end: Option<PlacedEndpoint>,
    preview: Option<LayerId>,
}

impl SelectionStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        match (&self.start, &self.end) {
            (None, _) => SelectionState::Empty,
            (Some(_), None) => SelectionState::HasStart,
            (Some(_), Some(_)) => SelectionState::HasBoth,
        }
    }

    pub fn start(&self) -> Option<Endpoint> {
        self.start.map(|placed| placed.endpoint)
    }

    pub fn end(&self) -> Option<Endpoint> {
        self.end.map(|placed| placed.endpoint)
    }

    /// Start and end locations, only once both are placed.
    pub fn endpoints(&self) -> Option<(Coordinate, Coordinate)> {
        Some((self.start?.endpoint.location, self.end?.endpoint.location))
    }

    pub fn preview_line(&self) -> Option<LayerId> {
        self.preview
    }

    pub fn on_click(
        &mut self,
        at: Coordinate,
        index: &RoadNetworkIndex,
        view: &mut impl MapView,
    ) -> ClickOutcome {
        match self.state() {
            SelectionState::Empty => {
                let endpoint = Self::place(EndpointRole::Start, at, index);
                self.start = Some(PlacedEndpoint {
                    endpoint,
                    marker: view.add_marker(&marker_for(endpoint)),
                });
                ClickOutcome::Placed(endpoint)
            }
            SelectionState::HasStart => {
                let endpoint = Self::place(EndpointRole::End, at, index);
                self.end = Some(PlacedEndpoint {
                    endpoint,
                    marker: view.add_marker(&marker_for(endpoint)),
                });
                if let Some((start, end)) = self.endpoints() {
                    self.preview = Some(view.add_polyline(&[start, end], LayerStyle::PREVIEW));
                    if let Some(bounds) = Bounds::from_coords([start, end]) {
                        view.fit_bounds(bounds);
                    }
                }
                ClickOutcome::Placed(endpoint)
            }
            SelectionState::HasBoth => {
                self.clear(view);
                ClickOutcome::Reset
            }
        }
    }

    /// Removes markers and preview line from the map and forgets both points.
    pub fn clear(&mut self, view: &mut impl MapView) {
        let layers = [
            self.start.take().map(|placed| placed.marker),
            self.end.take().map(|placed| placed.marker),
            self.preview.take(),
        ];
        for id in layers.into_iter().flatten() {
            view.remove_layer(id);
        }
    }

    fn place(role: EndpointRole, at: Coordinate, index: &RoadNetworkIndex) -> Endpoint {
        let location = index.nearest(at);
        tracing::debug!("{} click at {at} snapped to {location}", role.label());
        Endpoint { role, location }
    }
}

fn marker_for(endpoint: Endpoint) -> Marker {
    Marker {
        role: endpoint.role,
        at: endpoint.location,
        draggable: true,
    }
}

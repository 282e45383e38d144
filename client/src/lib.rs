//! Client side of the sun/shade walking planner: snaps map clicks to the road
//! network, asks the routing backend for the `sole` and `ombra` walks and
//! draws them through a [`view::MapView`].

pub mod config;
pub mod error;
pub mod geo;
pub mod network;
pub mod render;
pub mod request;
pub mod selection;
pub mod session;
pub mod view;

pub use config::ClientConfig;
pub use error::{NetworkLoadError, RouteError, TransportError};
pub use network::{NetworkSource, RoadNetwork, RoadNetworkIndex};
pub use render::{RenderPolicy, RouteRenderer};
pub use request::{RouteRequestClient, RoutingBackend};
pub use selection::{EndpointRole, SelectionState, SelectionStateMachine};
pub use session::{RouteOutcome, RouteTicket, Session};
pub use view::{HeadlessMapView, MapView, Notice};

pub use percorsi_shared as shared;

//! The map widget seen from the client logic.
//!
//! Hosts implement [`MapView`] on top of whatever actually draws the map. The
//! [`HeadlessMapView`] keeps the drawn state in memory, which is enough for the
//! command line and for tests.

use std::{collections::BTreeMap, fmt};

use geojson::FeatureCollection;
use percorsi_shared::{Bounds, Coordinate, PathType};

use crate::selection::EndpointRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerStyle {
    pub color: &'static str,
    pub weight: u8,
}

impl LayerStyle {
    pub const ROAD_NETWORK: Self = Self {
        color: "grey",
        weight: 2,
    };
    pub const PREVIEW: Self = Self {
        color: "red",
        weight: 3,
    };
    pub const SOLE: Self = Self {
        color: "orange",
        weight: 5,
    };
    pub const OMBRA: Self = Self {
        color: "blue",
        weight: 5,
    };

    pub fn for_path(kind: PathType) -> Self {
        match kind {
            PathType::Sole => Self::SOLE,
            PathType::Ombra => Self::OMBRA,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub role: EndpointRole,
    pub at: Coordinate,
    pub draggable: bool,
}

impl Marker {
    pub fn popup(&self) -> &'static str {
        self.role.label()
    }
}

/// User-visible blocking notices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    MissingEndpoints,
    SelectionReset,
    RouteNotFound,
    RouteError(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::MissingEndpoints => f.write_str("Seleziona i punti di partenza e arrivo"),
            Notice::SelectionReset => {
                f.write_str("Seleziona di nuovo i punti di partenza e arrivo")
            }
            Notice::RouteNotFound => f.write_str("Percorso non trovato!"),
            Notice::RouteError(detail) => write!(f, "Errore calcolo percorso: {detail}"),
        }
    }
}

pub trait MapView {
    fn add_marker(&mut self, marker: &Marker) -> LayerId;
    fn add_polyline(&mut self, path: &[Coordinate], style: LayerStyle) -> LayerId;
    fn add_geojson(&mut self, collection: &FeatureCollection, style: LayerStyle) -> LayerId;
    fn remove_layer(&mut self, id: LayerId);
    fn fit_bounds(&mut self, bounds: Bounds);
    fn notify(&mut self, notice: &Notice);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawnLayer {
    Marker(Marker),
    Polyline {
        path: Vec<Coordinate>,
        style: LayerStyle,
    },
    GeoJson {
        features: usize,
        bounds: Option<Bounds>,
        style: LayerStyle,
    },
}

impl DrawnLayer {
    pub fn style(&self) -> Option<LayerStyle> {
        match self {
            DrawnLayer::Marker(_) => None,
            DrawnLayer::Polyline { style, .. } | DrawnLayer::GeoJson { style, .. } => Some(*style),
        }
    }
}

#[derive(Debug, Default)]
pub struct HeadlessMapView {
    next_id: u64,
    layers: BTreeMap<LayerId, DrawnLayer>,
    fitted: Vec<Bounds>,
    notices: Vec<Notice>,
}

impl HeadlessMapView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layers(&self) -> impl Iterator<Item = (&LayerId, &DrawnLayer)> {
        self.layers.iter()
    }

    pub fn layer(&self, id: LayerId) -> Option<&DrawnLayer> {
        self.layers.get(&id)
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn count_styled(&self, style: LayerStyle) -> usize {
        self.layers
            .values()
            .filter(|layer| layer.style() == Some(style))
            .count()
    }

    /// Number of `sole` and `ombra` layers currently on the map.
    pub fn route_layer_count(&self) -> usize {
        self.count_styled(LayerStyle::SOLE) + self.count_styled(LayerStyle::OMBRA)
    }

    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.layers.values().filter_map(|layer| match layer {
            DrawnLayer::Marker(marker) => Some(marker),
            _ => None,
        })
    }

    pub fn fitted(&self) -> &[Bounds] {
        &self.fitted
    }

    pub fn last_fit(&self) -> Option<Bounds> {
        self.fitted.last().copied()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    fn insert(&mut self, layer: DrawnLayer) -> LayerId {
        self.next_id += 1;
        let id = LayerId(self.next_id);
        self.layers.insert(id, layer);
        id
    }
}

impl MapView for HeadlessMapView {
    fn add_marker(&mut self, marker: &Marker) -> LayerId {
        tracing::debug!("marker {} at {}", marker.popup(), marker.at);
        self.insert(DrawnLayer::Marker(marker.clone()))
    }

    fn add_polyline(&mut self, path: &[Coordinate], style: LayerStyle) -> LayerId {
        tracing::debug!("{} polyline with {} points", style.color, path.len());
        self.insert(DrawnLayer::Polyline {
            path: path.to_vec(),
            style,
        })
    }

    fn add_geojson(&mut self, collection: &FeatureCollection, style: LayerStyle) -> LayerId {
        tracing::debug!(
            "{} geojson layer with {} features",
            style.color,
            collection.features.len()
        );
        self.insert(DrawnLayer::GeoJson {
            features: collection.features.len(),
            bounds: Bounds::from_feature_collection(collection),
            style,
        })
    }

    fn remove_layer(&mut self, id: LayerId) {
        if self.layers.remove(&id).is_none() {
            tracing::warn!("removing unknown layer {id:?}");
        }
    }

    fn fit_bounds(&mut self, bounds: Bounds) {
        tracing::debug!(
            "fit view to [{:.5}, {:.5}] x [{:.5}, {:.5}]",
            bounds.min_lat,
            bounds.max_lat,
            bounds.min_lon,
            bounds.max_lon
        );
        self.fitted.push(bounds);
    }

    fn notify(&mut self, notice: &Notice) {
        tracing::info!("notice: {notice}");
        self.notices.push(notice.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_render_user_messages() {
        assert_eq!(Notice::RouteNotFound.to_string(), "Percorso non trovato!");
        assert_eq!(
            Notice::RouteError("timeout".into()).to_string(),
            "Errore calcolo percorso: timeout"
        );
    }

    #[test]
    fn headless_view_tracks_added_and_removed_layers() {
        let mut view = HeadlessMapView::new();
        let a = view.add_polyline(
            &[Coordinate::new(40.0, 14.0), Coordinate::new(40.1, 14.1)],
            LayerStyle::PREVIEW,
        );
        let b = view.add_marker(&Marker {
            role: EndpointRole::Start,
            at: Coordinate::new(40.0, 14.0),
            draggable: true,
        });
        assert_ne!(a, b);
        assert_eq!(view.layer_count(), 2);
        assert_eq!(view.count_styled(LayerStyle::PREVIEW), 1);

        view.remove_layer(a);
        assert_eq!(view.layer_count(), 1);
        assert_eq!(view.markers().count(), 1);
    }
}

use std::{fmt, str::FromStr};

use percorsi_shared::{Bounds, PathType, RouteResult};

use crate::{
    error::RouteError,
    view::{LayerId, LayerStyle, MapView, Notice},
};

/// Which returned paths get drawn.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum RenderPolicy {
    /// Only the path named by the `tipo` filter; both when no filter is set.
    #[default]
    Filtered,
    /// Unfiltered: every non-empty path is drawn and `tipo` is ignored, so a
    /// filtered query can still get both layers.
    All,
}

impl RenderPolicy {
    pub fn draws(self, kind: PathType, filter: Option<PathType>) -> bool {
        match self {
            RenderPolicy::All => true,
            RenderPolicy::Filtered => filter.is_none_or(|wanted| wanted == kind),
        }
    }
}

impl fmt::Display for RenderPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderPolicy::Filtered => f.write_str("filtered"),
            RenderPolicy::All => f.write_str("all"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown render policy `{0}` (expected `filtered` or `all`)")]
pub struct UnknownRenderPolicy(pub String);

impl FromStr for RenderPolicy {
    type Err = UnknownRenderPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "filtered" => Ok(RenderPolicy::Filtered),
            "all" => Ok(RenderPolicy::All),
            other => Err(UnknownRenderPolicy(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rendered {
    pub layers: usize,
    /// Union of the drawn geometries; `None` only for position-less features.
    pub bounds: Option<Bounds>,
}

/// Owns the `sole` / `ombra` layers currently on the map.
#[derive(Debug, Default)]
pub struct RouteRenderer {
    policy: RenderPolicy,
    drawn: Vec<(PathType, LayerId)>,
}

impl RouteRenderer {
    pub fn new(policy: RenderPolicy) -> Self {
        Self {
            policy,
            drawn: Vec::new(),
        }
    }

    pub fn policy(&self) -> RenderPolicy {
        self.policy
    }

    pub fn drawn(&self) -> &[(PathType, LayerId)] {
        &self.drawn
    }

    pub fn clear(&mut self, view: &mut impl MapView) {
        for (_, id) in self.drawn.drain(..) {
            view.remove_layer(id);
        }
    }

    /// Replaces whatever was drawn with the paths of `result` selected by
    /// `filter`, then fits the view to them.
    ///
    /// Fails with `NoRouteFound` (after notifying) when nothing could be
    /// drawn; the view is left unfitted in that case.
    pub fn render(
        &mut self,
        result: &RouteResult,
        filter: Option<PathType>,
        view: &mut impl MapView,
    ) -> Result<Rendered, RouteError> {
        self.clear(view);

        let mut bounds: Option<Bounds> = None;
        for kind in PathType::ALL {
            if !self.policy.draws(kind, filter) {
                continue;
            }
            let Some(collection) = result.non_empty_path(kind) else {
                continue;
            };
            let id = view.add_geojson(collection, LayerStyle::for_path(kind));
            self.drawn.push((kind, id));
            if let Some(layer_bounds) = Bounds::from_feature_collection(collection) {
                bounds = Some(match bounds {
                    Some(acc) => acc.union(layer_bounds),
                    None => layer_bounds,
                });
            }
        }

        if self.drawn.is_empty() {
            view.notify(&Notice::RouteNotFound);
            return Err(RouteError::NoRouteFound);
        }
        tracing::debug!("rendered {} route layer(s)", self.drawn.len());
        if let Some(bounds) = bounds {
            view.fit_bounds(bounds);
        }
        Ok(Rendered {
            layers: self.drawn.len(),
            bounds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::HeadlessMapView;
    use serde_json::json;

    fn collection(coords: serde_json::Value) -> serde_json::Value {
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {},
                "geometry": { "type": "LineString", "coordinates": coords }
            }]
        })
    }

    fn both_paths() -> RouteResult {
        serde_json::from_value(json!({
            "sole": collection(json!([[14.790, 40.770], [14.792, 40.773]])),
            "ombra": collection(json!([[14.789, 40.770], [14.791, 40.774]])),
        }))
        .unwrap()
    }

    #[test]
    fn test_filtered_policy_draws_only_requested_path() {
        let mut view = HeadlessMapView::new();
        let mut renderer = RouteRenderer::new(RenderPolicy::Filtered);

        let rendered = renderer
            .render(&both_paths(), Some(PathType::Sole), &mut view)
            .unwrap();
        let bounds = rendered.bounds.unwrap();

        assert_eq!(rendered.layers, 1);
        assert_eq!(view.count_styled(LayerStyle::SOLE), 1);
        assert_eq!(view.count_styled(LayerStyle::OMBRA), 0);
        assert_eq!(bounds.max_lat, 40.773);
        assert_eq!(view.last_fit(), Some(bounds));
    }

    #[test]
    fn test_all_policy_draws_both_and_fits_union() {
        let mut view = HeadlessMapView::new();
        let mut renderer = RouteRenderer::new(RenderPolicy::All);

        let bounds = renderer
            .render(&both_paths(), Some(PathType::Sole), &mut view)
            .unwrap()
            .bounds
            .unwrap();

        assert_eq!(view.route_layer_count(), 2);
        assert_eq!(bounds.min_lon, 14.789);
        assert_eq!(bounds.max_lat, 40.774);
    }

    #[test]
    fn test_missing_filter_draws_every_path() {
        let mut view = HeadlessMapView::new();
        let mut renderer = RouteRenderer::default();
        renderer.render(&both_paths(), None, &mut view).unwrap();
        assert_eq!(view.route_layer_count(), 2);
    }

    #[test]
    fn test_empty_result_notifies_without_fitting() {
        let mut view = HeadlessMapView::new();
        let mut renderer = RouteRenderer::default();
        let empty: RouteResult = serde_json::from_value(json!({
            "sole": { "type": "FeatureCollection", "features": [] },
            "ombra": { "type": "FeatureCollection", "features": [] },
        }))
        .unwrap();

        let err = renderer
            .render(&empty, Some(PathType::Sole), &mut view)
            .unwrap_err();

        assert!(matches!(err, RouteError::NoRouteFound));
        assert_eq!(view.route_layer_count(), 0);
        assert_eq!(view.notices(), &[Notice::RouteNotFound]);
        assert!(view.fitted().is_empty());
    }

    #[test]
    fn test_render_twice_clears_previous_layers() {
        let mut view = HeadlessMapView::new();
        let mut renderer = RouteRenderer::default();
        let only_sole: RouteResult = serde_json::from_value(json!({
            "sole": collection(json!([[14.790, 40.770], [14.792, 40.773]])),
        }))
        .unwrap();

        renderer.render(&only_sole, None, &mut view).unwrap();
        assert_eq!(view.route_layer_count(), 1);
        let _ = renderer.render(&RouteResult::default(), None, &mut view);

        assert_eq!(view.route_layer_count(), 0);
        assert!(renderer.drawn().is_empty());
    }

    #[test]
    fn test_policy_parses() {
        assert_eq!("ALL".parse::<RenderPolicy>().unwrap(), RenderPolicy::All);
        assert!("some".parse::<RenderPolicy>().is_err());
    }
}

use crate::config::MapConfig;
use crate::popup;
use crate::types::Site;
use geo::algorithm::bounding_rect::BoundingRect;
use geo::{MultiPoint, Point};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::Serialize;
use serde_json::json;

// (category, fill color, sidebar badge)
const CATEGORY_STYLES: [(&str, &str, &str); 5] = [
    ("Amazônia", "green", "🟢"),
    ("Caatinga", "yellow", "🟡"),
    ("Cerrado", "orange", "🟠"),
    ("Mata Atlântica", "purple", "🟣"),
    ("Pampa", "blue", "🔵"),
];

pub const FALLBACK_COLOR: &str = "gray";
pub const FALLBACK_BADGE: &str = "⚫";

pub const MARKER_RADIUS: u32 = 8;
pub const OUTLINE_COLOR: &str = "black";
pub const OUTLINE_WEIGHT: u32 = 2;
pub const FILL_OPACITY: f64 = 0.8;
pub const POPUP_MAX_WIDTH: u32 = 300;

pub fn color_of(category: &str) -> &'static str {
    CATEGORY_STYLES
        .iter()
        .find(|(name, _, _)| *name == category)
        .map_or(FALLBACK_COLOR, |&(_, color, _)| color)
}

pub fn badge_of(category: &str) -> &'static str {
    CATEGORY_STYLES
        .iter()
        .find(|(name, _, _)| *name == category)
        .map_or(FALLBACK_BADGE, |&(_, _, badge)| badge)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewDefaults {
    pub center: [f64; 2],
    pub zoom: u8,
    pub tooltip_budget: usize,
}

impl From<&MapConfig> for ViewDefaults {
    fn from(config: &MapConfig) -> Self {
        Self {
            center: config.center,
            zoom: config.zoom,
            tooltip_budget: config.tooltip_budget,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Viewport {
    pub center: [f64; 2],
    pub zoom: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bounds {
    pub south_west: [f64; 2],
    pub north_east: [f64; 2],
}

#[cfg(test)]
impl Bounds {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.south_west[0]..=self.north_east[0]).contains(&lat)
            && (self.south_west[1]..=self.north_east[1]).contains(&lon)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub name: String,
    pub category: String,
    pub lat: f64,
    pub lon: f64,
    pub fill_color: &'static str,
    pub tooltip: String,
    pub popup: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum MapView {
    Empty {
        viewport: Viewport,
    },
    Populated {
        viewport: Viewport,
        bounds: Bounds,
        // sent as the GeoJSON layer
        #[serde(skip)]
        markers: Vec<Marker>,
    },
}

impl MapView {
    pub fn markers(&self) -> &[Marker] {
        match self {
            MapView::Empty { .. } => &[],
            MapView::Populated { markers, .. } => markers,
        }
    }

    pub fn to_geojson(&self) -> FeatureCollection {
        let features = self
            .markers()
            .iter()
            .map(|marker| {
                let mut properties = JsonObject::new();
                properties.insert("name".to_string(), json!(marker.name));
                properties.insert("category".to_string(), json!(marker.category));
                properties.insert("tooltip".to_string(), json!(marker.tooltip));
                properties.insert("popup".to_string(), json!(marker.popup));
                properties.insert("popupMaxWidth".to_string(), json!(POPUP_MAX_WIDTH));
                properties.insert(
                    "style".to_string(),
                    json!({
                        "radius": MARKER_RADIUS,
                        "color": OUTLINE_COLOR,
                        "weight": OUTLINE_WEIGHT,
                        "fillColor": marker.fill_color,
                        "fillOpacity": FILL_OPACITY,
                    }),
                );
                Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(Value::Point(vec![marker.lon, marker.lat]))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        FeatureCollection { bbox: None, features, foreign_members: None }
    }
}

pub fn render<F>(sites: &[&Site], color_of: F, defaults: &ViewDefaults) -> MapView
where
    F: Fn(&str) -> &'static str,
{
    let points: MultiPoint<f64> = sites.iter().map(|s| s.point).collect::<Vec<Point<f64>>>().into();
    let Some(rect) = points.bounding_rect() else {
        return MapView::Empty {
            viewport: Viewport { center: defaults.center, zoom: defaults.zoom },
        };
    };

    let markers = sites
        .iter()
        .map(|site| Marker {
            name: site.name.clone(),
            category: site.category.clone(),
            lat: site.lat(),
            lon: site.lon(),
            fill_color: color_of(&site.category),
            tooltip: popup::tooltip(&site.name, defaults.tooltip_budget),
            popup: popup::popup_html(site),
        })
        .collect();

    let center = rect.center();
    MapView::Populated {
        viewport: Viewport { center: [center.y, center.x], zoom: defaults.zoom },
        bounds: Bounds {
            south_west: [rect.min().y, rect.min().x],
            north_east: [rect.max().y, rect.max().x],
        },
        markers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::site;

    fn defaults() -> ViewDefaults {
        ViewDefaults::from(&MapConfig::default())
    }

    #[test]
    fn empty_selection_uses_default_view() {
        let view = render(&[], color_of, &defaults());
        assert_eq!(
            view,
            MapView::Empty { viewport: Viewport { center: [-14.235004, -51.92528], zoom: 4 } }
        );
        assert!(view.markers().is_empty());
        assert!(view.to_geojson().features.is_empty());
    }

    #[test]
    fn marker_color_follows_category_table() {
        let sites: Vec<Site> = CATEGORY_STYLES
            .iter()
            .enumerate()
            .map(|(i, (category, _, _))| site(&format!("S{i}"), category, -10.0, -50.0 - i as f64))
            .chain(std::iter::once(site("X", "Pantanal", -18.0, -57.0)))
            .collect();
        let refs: Vec<&Site> = sites.iter().collect();

        let view = render(&refs, color_of, &defaults());
        let colors: Vec<&str> = view.markers().iter().map(|m| m.fill_color).collect();
        assert_eq!(colors, ["green", "yellow", "orange", "purple", "blue", FALLBACK_COLOR]);
    }

    #[test]
    fn badges_fall_back_for_unknown_categories() {
        assert_eq!(badge_of("Cerrado"), "🟠");
        assert_eq!(badge_of("Pantanal"), FALLBACK_BADGE);
    }

    #[test]
    fn category_colors_are_distinct() {
        for (i, (_, color, _)) in CATEGORY_STYLES.iter().enumerate() {
            assert_ne!(*color, FALLBACK_COLOR);
            assert!(CATEGORY_STYLES[i + 1..].iter().all(|(_, other, _)| other != color));
        }
    }

    #[test]
    fn amazon_selection_renders_two_markers_in_view() {
        let a = site("A", "Amazônia", -3.0, -60.0);
        let c = site("C", "Amazônia", -3.5, -61.0);

        let view = render(&[&a, &c], color_of, &defaults());
        let MapView::Populated { viewport, bounds, markers } = &view else {
            panic!("expected a populated map");
        };

        assert_eq!(markers.len(), 2);
        assert!(markers.iter().all(|m| m.fill_color == "green"));
        assert!(bounds.contains(-3.0, -60.0));
        assert!(bounds.contains(-3.5, -61.0));
        assert_eq!(viewport.center, [-3.25, -60.5]);
        assert!(bounds.contains(viewport.center[0], viewport.center[1]));
    }

    #[test]
    fn single_site_is_centered_on_itself() {
        let b = site("B", "Cerrado", -15.0, -47.0);
        let view = render(&[&b], color_of, &defaults());
        let MapView::Populated { viewport, .. } = view else {
            panic!("expected a populated map");
        };
        assert_eq!(viewport.center, [-15.0, -47.0]);
    }

    #[test]
    fn tooltip_uses_configured_budget() {
        let long = site(&"x".repeat(12), "Pampa", -30.0, -53.0);
        let view = render(&[&long], color_of, &ViewDefaults { tooltip_budget: 10, ..defaults() });
        assert_eq!(view.markers()[0].tooltip, format!("{}...", "x".repeat(10)));
    }

    #[test]
    fn tooltip_markup_is_escaped() {
        let odd = site("<b>Rio & Mar</b>", "Amazônia", -3.0, -60.0);
        let view = render(&[&odd], color_of, &defaults());
        let tooltip = &view.markers()[0].tooltip;
        assert_eq!(tooltip, "&lt;b&gt;Rio &amp; Mar&lt;/b&gt;");

        let layer = view.to_geojson();
        assert_eq!(layer.features[0].properties.as_ref().unwrap()["tooltip"], tooltip.as_str());
    }

    #[test]
    fn geojson_carries_marker_style() {
        let a = site("A", "Amazônia", -3.0, -60.0);
        let collection = render(&[&a], color_of, &defaults()).to_geojson();
        let feature = &collection.features[0];

        assert_eq!(
            feature.geometry.as_ref().map(|g| g.value.clone()),
            Some(Value::Point(vec![-60.0, -3.0]))
        );
        let style = &feature.properties.as_ref().unwrap()["style"];
        assert_eq!(style["fillColor"], "green");
        assert_eq!(style["color"], OUTLINE_COLOR);
        assert_eq!(style["weight"], OUTLINE_WEIGHT);
        assert_eq!(style["fillOpacity"], FILL_OPACITY);
    }

    #[test]
    fn view_serializes_with_state_tag() {
        let json = serde_json::to_value(render(&[], color_of, &defaults())).unwrap();
        assert_eq!(json["state"], "empty");
        assert_eq!(json["viewport"]["zoom"], 4);
    }
}

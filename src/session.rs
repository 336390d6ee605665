use crate::data::{DataSource, Preselection};
use crate::error::{DataUnavailable, SelectionError};
use crate::processing::visible_sites;
use crate::render::{self, MapView, ViewDefaults};
use crate::selection::SelectionState;
use crate::types::Dataset;
use geojson::FeatureCollection;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub name: String,
    pub badge: &'static str,
    pub color: &'static str,
    pub count: usize,
    pub options: Vec<String>,
    pub selected: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreselectionSummary {
    pub loaded: usize,
    pub active: bool,
    pub warning: Option<String>,
}

/// Everything the page needs to draw itself after one interaction.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub categories: Vec<CategorySummary>,
    pub preselection: PreselectionSummary,
    pub total_sites: usize,
    pub excluded_rows: usize,
    pub selected_count: usize,
    pub map: MapView,
    pub layer: FeatureCollection,
}

#[derive(Debug)]
pub struct Session {
    dataset: Arc<Dataset>,
    preselection: Arc<Preselection>,
    selection: SelectionState,
}

impl Session {
    pub fn open(source: &DataSource) -> Result<Self, DataUnavailable> {
        let dataset = source.sites()?;
        let preselection = source.preselection();
        Ok(Self::new(dataset, preselection))
    }

    pub fn new(dataset: Arc<Dataset>, preselection: Arc<Preselection>) -> Self {
        let selection = SelectionState::seeded(&dataset, &preselection.names);
        Self { dataset, preselection, selection }
    }

    pub fn set_selection(&mut self, category: &str, names: &[String]) -> Result<usize, SelectionError> {
        self.selection.set_selection(category, names)
    }

    pub fn clear_preselection(&mut self) {
        info!("Clearing preselection");
        self.selection.clear_all();
    }

    pub fn snapshot(&self, defaults: &ViewDefaults) -> Snapshot {
        let categories = self
            .dataset
            .categories()
            .into_iter()
            .map(|group| {
                let selected: Vec<String> = self
                    .selection
                    .selected_in(group.name)
                    .map(|chosen| {
                        group
                            .sites
                            .iter()
                            .filter(|name| chosen.contains(**name))
                            .map(|name| name.to_string())
                            .collect()
                    })
                    .unwrap_or_default();
                CategorySummary {
                    name: group.name.to_string(),
                    badge: render::badge_of(group.name),
                    color: render::color_of(group.name),
                    count: group.sites.len(),
                    options: group.sites.iter().map(|name| name.to_string()).collect(),
                    selected,
                }
            })
            .collect();

        let visible = visible_sites(&self.dataset, &self.selection);
        let map = render::render(&visible, render::color_of, defaults);
        let layer = map.to_geojson();

        Snapshot {
            categories,
            preselection: PreselectionSummary {
                loaded: self.preselection.names.len(),
                active: self.selection.seed().is_some(),
                warning: self.preselection.warning.clone(),
            },
            total_sites: self.dataset.len(),
            excluded_rows: self.dataset.excluded().len(),
            selected_count: visible.len(),
            map,
            layer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InputConfig, MapConfig};
    use crate::types::site;

    fn session(preselected: &[&str]) -> Session {
        let dataset = Dataset::new(vec![
            (2, site("A", "Amazônia", -3.0, -60.0)),
            (3, site("B", "Cerrado", -15.0, -47.0)),
            (4, site("C", "Amazônia", -3.5, -61.0)),
            (5, site("D", "Cerrado", 95.0, -47.0)),
        ]);
        let preselection = Preselection {
            names: preselected.iter().map(|s| s.to_string()).collect(),
            warning: None,
        };
        Session::new(Arc::new(dataset), Arc::new(preselection))
    }

    fn defaults() -> ViewDefaults {
        ViewDefaults::from(&MapConfig::default())
    }

    #[test]
    fn preselection_seeds_the_first_snapshot() {
        let session = session(&["B", "Z"]);
        let snapshot = session.snapshot(&defaults());

        assert_eq!(snapshot.selected_count, 1);
        assert_eq!(snapshot.categories[1].name, "Cerrado");
        assert_eq!(snapshot.categories[1].selected, ["B"]);
        assert!(snapshot.categories[0].selected.is_empty());
        assert_eq!(snapshot.preselection.loaded, 2);
        assert!(snapshot.preselection.active);
        assert_eq!(snapshot.excluded_rows, 1);
        assert_eq!(snapshot.total_sites, 3);
    }

    #[test]
    fn category_summaries_count_members() {
        let snapshot = session(&[]).snapshot(&defaults());
        let amazon = &snapshot.categories[0];
        assert_eq!(amazon.name, "Amazônia");
        assert_eq!(amazon.badge, "🟢");
        assert_eq!(amazon.color, "green");
        assert_eq!(amazon.count, 2);
        assert_eq!(amazon.options, ["A", "C"]);
        assert!(!snapshot.preselection.active);
    }

    #[test]
    fn selecting_a_category_redraws_the_map() {
        let mut session = session(&[]);
        assert!(matches!(session.snapshot(&defaults()).map, MapView::Empty { .. }));

        session.set_selection("Amazônia", &["A".to_string(), "C".to_string()]).unwrap();
        let snapshot = session.snapshot(&defaults());
        assert_eq!(snapshot.selected_count, 2);
        assert_eq!(snapshot.map.markers().len(), 2);
        assert_eq!(snapshot.layer.features.len(), 2);
    }

    #[test]
    fn markers_are_sent_once_as_the_layer() {
        let snapshot = session(&["A", "B"]).snapshot(&defaults());
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["map"]["state"], "populated");
        assert!(json["map"].get("markers").is_none());
        assert!(json["map"].get("bounds").is_some());
        assert_eq!(json["layer"]["features"].as_array().unwrap().len(), 2);
        assert_eq!(snapshot.map.markers().len(), 2);
    }

    #[test]
    fn clearing_resets_to_the_empty_map() {
        let mut session = session(&["A", "B"]);
        session.clear_preselection();

        let snapshot = session.snapshot(&defaults());
        assert_eq!(snapshot.selected_count, 0);
        assert!(snapshot.categories.iter().all(|c| c.selected.is_empty()));
        assert!(matches!(snapshot.map, MapView::Empty { .. }));
        assert!(!snapshot.preselection.active);
    }

    #[test]
    fn missing_dataset_never_opens_a_session() {
        let dir = tempfile::tempdir().unwrap();
        let source = DataSource::new(&InputConfig {
            sites_csv: dir.path().join("selecionados.csv"),
            preselection_csv: dir.path().join("pre_selecionados.csv"),
        });
        assert!(Session::open(&source).is_err());
    }
}

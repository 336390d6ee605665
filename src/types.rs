use geo::Point;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub name: String,
    pub category: String,
    pub point: Point<f64>, // x = lon, y = lat
    pub weather: String,
    pub population: String,
    pub region: String,
}

impl Site {
    pub fn lat(&self) -> f64 {
        self.point.y()
    }

    pub fn lon(&self) -> f64 {
        self.point.x()
    }

    pub fn has_valid_coordinate(&self) -> bool {
        let (lat, lon) = (self.lat(), self.lon());
        lat.is_finite() && lon.is_finite() && lat.abs() <= 90.0 && lon.abs() <= 180.0
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowIssue {
    #[error("missing name")]
    MissingName,
    #[error("missing category")]
    MissingCategory,
    #[error("invalid coordinate (lat {lat}, lon {lon})")]
    InvalidCoordinate { lat: f64, lon: f64 },
    #[error("duplicate name")]
    DuplicateName,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExcludedRow {
    pub line: u64,
    pub name: String,
    pub issue: RowIssue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup<'a> {
    pub name: &'a str,
    pub sites: Vec<&'a str>,
}

/// The validated site table. Names are unique, so categories partition it.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    sites: Vec<Site>,
    excluded: Vec<ExcludedRow>,
}

impl Dataset {
    pub fn new(candidates: impl IntoIterator<Item = (u64, Site)>) -> Self {
        let mut seen = HashSet::new();
        let mut sites = Vec::new();
        let mut excluded = Vec::new();

        for (line, site) in candidates {
            let issue = if site.name.is_empty() {
                Some(RowIssue::MissingName)
            } else if site.category.is_empty() {
                Some(RowIssue::MissingCategory)
            } else if !site.has_valid_coordinate() {
                Some(RowIssue::InvalidCoordinate { lat: site.lat(), lon: site.lon() })
            } else if seen.contains(&site.name) {
                Some(RowIssue::DuplicateName)
            } else {
                None
            };

            match issue {
                Some(issue) => excluded.push(ExcludedRow { line, name: site.name, issue }),
                None => {
                    seen.insert(site.name.clone());
                    sites.push(site);
                }
            }
        }

        Self { sites, excluded }
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn excluded(&self) -> &[ExcludedRow] {
        &self.excluded
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn categories(&self) -> Vec<CategoryGroup<'_>> {
        let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for site in &self.sites {
            groups.entry(site.category.as_str()).or_default().push(site.name.as_str());
        }
        groups.into_iter().map(|(name, sites)| CategoryGroup { name, sites }).collect()
    }
}

#[cfg(test)]
pub(crate) fn site(name: &str, category: &str, lat: f64, lon: f64) -> Site {
    Site {
        name: name.to_string(),
        category: category.to_string(),
        point: Point::new(lon, lat),
        weather: "Seca".to_string(),
        population: "120".to_string(),
        region: "Norte".to_string(),
    }
}

use crate::config::InputConfig;
use crate::error::{DataUnavailable, LoadError, PreselectionUnavailable};
use crate::types::{Dataset, Site};
use csv::{Reader, ReaderBuilder, StringRecord, Trim};
use geo::Point;
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

const REQUIRED_COLUMNS: [&str; 7] = [
    "Nome",
    "Bioma",
    "Intempérie",
    "População Quilombola",
    "Macrorregião",
    "Latitude",
    "Longitude",
];

// Coordinates stay text so a bad value only excludes its row
#[derive(Debug, Deserialize)]
struct SiteRecord {
    #[serde(rename = "Nome")]
    name: String,
    #[serde(rename = "Bioma")]
    category: String,
    #[serde(rename = "Intempérie")]
    weather: String,
    #[serde(rename = "População Quilombola")]
    population: String,
    #[serde(rename = "Macrorregião")]
    region: String,
    #[serde(rename = "Latitude")]
    latitude: String,
    #[serde(rename = "Longitude")]
    longitude: String,
}

impl From<SiteRecord> for Site {
    fn from(record: SiteRecord) -> Self {
        let lat = parse_coordinate(&record.latitude);
        let lon = parse_coordinate(&record.longitude);
        Site {
            name: record.name,
            category: record.category,
            point: Point::new(lon, lat),
            weather: record.weather,
            population: record.population,
            region: record.region,
        }
    }
}

fn parse_coordinate(value: &str) -> f64 {
    value.trim().parse().unwrap_or(f64::NAN)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preselection {
    pub names: Vec<String>,
    pub warning: Option<String>,
}

fn open_csv(path: &Path) -> Result<Reader<File>, LoadError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => LoadError::Missing { path: path.to_path_buf() },
        _ => LoadError::Read { path: path.to_path_buf(), source: e.into() },
    })?;
    Ok(ReaderBuilder::new().trim(Trim::All).from_reader(file))
}

fn read_headers(rdr: &mut Reader<File>, path: &Path) -> Result<StringRecord, LoadError> {
    rdr.headers()
        .cloned()
        .map_err(|source| LoadError::Read { path: path.to_path_buf(), source })
}

pub fn load_sites(path: &Path) -> Result<Dataset, DataUnavailable> {
    info!("Loading sites from {:?}", path);
    let mut rdr = open_csv(path)?;
    let headers = read_headers(&mut rdr, path)?;

    if let Some(column) = REQUIRED_COLUMNS.into_iter().find(|c| !headers.iter().any(|h| h == *c)) {
        return Err(LoadError::MissingColumn { path: path.to_path_buf(), column }.into());
    }

    let mut candidates = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|source| LoadError::Read { path: path.to_path_buf(), source })?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let row: SiteRecord = record
            .deserialize(Some(&headers))
            .map_err(|source| LoadError::Read { path: path.to_path_buf(), source })?;
        candidates.push((line, Site::from(row)));
    }

    let dataset = Dataset::new(candidates);
    if dataset.is_empty() {
        warn!("{:?} has no plottable sites", path);
    }
    for row in dataset.excluded() {
        warn!("Skipping line {} ({:?}): {}", row.line, row.name, row.issue);
    }
    info!(
        "Loaded {} sites ({} rows excluded)",
        dataset.len(),
        dataset.excluded().len()
    );

    Ok(dataset)
}

fn read_preselection(path: &Path) -> Result<Vec<String>, PreselectionUnavailable> {
    let mut rdr = open_csv(path)?;
    let headers = read_headers(&mut rdr, path)?;

    let column = headers
        .iter()
        .position(|h| h == "Nome")
        .or_else(|| headers.iter().position(|h| h == "nome"))
        .or(if headers.is_empty() { None } else { Some(0) })
        .ok_or_else(|| LoadError::NoColumns { path: path.to_path_buf() })?;

    let mut names = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|source| LoadError::Read { path: path.to_path_buf(), source })?;
        match record.get(column) {
            Some(name) if !name.is_empty() => names.push(name.to_string()),
            _ => {}
        }
    }
    Ok(names)
}

/// Never fails; an unusable file means no preselection.
pub fn load_preselection(path: &Path) -> Preselection {
    match read_preselection(path) {
        Ok(names) => {
            info!("Loaded {} preselected names from {:?}", names.len(), path);
            Preselection { names, warning: None }
        }
        Err(e) => {
            let message = match &e.0 {
                LoadError::Missing { .. } => {
                    format!("{:?} not found, no community will be preselected", path)
                }
                other => format!("{}: {}", e, other),
            };
            warn!("{}", message);
            Preselection { names: Vec::new(), warning: Some(message) }
        }
    }
}

#[derive(Debug)]
pub struct DataSource {
    sites_path: PathBuf,
    preselection_path: PathBuf,
    sites: OnceCell<Arc<Dataset>>,
    preselection: OnceCell<Arc<Preselection>>,
}

impl DataSource {
    pub fn new(input: &InputConfig) -> Self {
        Self {
            sites_path: input.sites_csv.clone(),
            preselection_path: input.preselection_csv.clone(),
            sites: OnceCell::new(),
            preselection: OnceCell::new(),
        }
    }

    /// A failed load is not cached; the next call retries.
    pub fn sites(&self) -> Result<Arc<Dataset>, DataUnavailable> {
        self.sites
            .get_or_try_init(|| load_sites(&self.sites_path).map(Arc::new))
            .cloned()
    }

    pub fn preselection(&self) -> Arc<Preselection> {
        self.preselection
            .get_or_init(|| Arc::new(load_preselection(&self.preselection_path)))
            .clone()
    }
}

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub input: InputConfig,
    pub map: MapConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    pub sites_csv: PathBuf,
    pub preselection_csv: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            sites_csv: PathBuf::from("selecionados.csv"),
            preselection_csv: PathBuf::from("pre_selecionados.csv"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapConfig {
    pub title: String,
    // [lat, lon]
    pub center: [f64; 2],
    pub zoom: u8,
    pub height: u32,
    pub tile_url: String,
    pub attribution: String,
    pub tooltip_budget: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            title: "Mapa das Comunidades Quilombolas do Brasil".to_string(),
            center: [-14.235004, -51.92528],
            zoom: 4,
            height: 600,
            tile_url: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; OpenStreetMap contributors".to_string(),
            tooltip_budget: 40,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: IpAddr::V4(Ipv4Addr::LOCALHOST), port: 8501 }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }

    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            info!("No config at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[map]\nzoom = 6\n\n[server]\nport = 9000").unwrap();

        let config = AppConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.map.zoom, 6);
        assert_eq!(config.map.height, 600);
        assert_eq!(config.map.tooltip_budget, 40);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.input.sites_csv, PathBuf::from("selecionados.csv"));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.map.center, [-14.235004, -51.92528]);
        assert_eq!(config.server.addr().port(), 8501);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[map\nzoom = ").unwrap();
        assert!(AppConfig::load_or_default(file.path()).is_err());
    }
}

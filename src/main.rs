pub mod types;
pub mod error;
pub mod config;
pub mod data;
pub mod selection;
pub mod processing;
pub mod popup;
pub mod render;
pub mod session;
pub mod html;
pub mod server;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the interactive map
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        /// Overrides `server.port` from the config
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Write a standalone page showing the preselected communities
    Render {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        #[arg(short, long, value_name = "FILE", default_value = "mapa.html")]
        output: PathBuf,
    },
}

fn open_session(app_config: &config::AppConfig) -> anyhow::Result<session::Session> {
    let source = data::DataSource::new(&app_config.input);
    session::Session::open(&source).map_err(|e| {
        error!("{:#}", anyhow::Error::from(e));
        anyhow::anyhow!("cannot render the map without {:?}", app_config.input.sites_csv)
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, port } => {
            let mut app_config = config::AppConfig::load_or_default(&config)?;
            if let Some(port) = port {
                app_config.server.port = port;
            }

            let session = open_session(&app_config)?;
            server::start_server(app_config, session).await?;
        }
        Commands::Render { config, output } => {
            let app_config = config::AppConfig::load_or_default(&config)?;
            let session = open_session(&app_config)?;

            let snapshot = session.snapshot(&render::ViewDefaults::from(&app_config.map));
            let page = html::render_page(&app_config.map, html::PageMode::Snapshot(&snapshot))?;
            fs::write(&output, page).with_context(|| format!("Failed to write {:?}", output))?;

            info!("Wrote {} markers to {:?}", snapshot.selected_count, output);
        }
    }

    Ok(())
}

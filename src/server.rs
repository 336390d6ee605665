use crate::config::AppConfig;
use crate::error::SelectionError;
use crate::html::{self, PageMode};
use crate::render::ViewDefaults;
use crate::session::{Session, Snapshot};
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

pub struct AppState {
    pub session: Mutex<Session>,
    pub defaults: ViewDefaults,
    pub page: String,
}

impl AppState {
    pub fn new(config: &AppConfig, session: Session) -> Result<Self> {
        let page = html::render_page(&config.map, PageMode::Live)
            .context("Failed to build the map page")?;
        Ok(Self {
            session: Mutex::new(session),
            defaults: ViewDefaults::from(&config.map),
            page,
        })
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> Snapshot {
        self.session().snapshot(&self.defaults)
    }
}

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    category: String,
    names: Vec<String>,
}

struct ApiError(SelectionError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            SelectionError::UnknownCategory(_) => StatusCode::NOT_FOUND,
        };
        (status, self.0.to_string()).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/state", get(state_handler))
        .route("/api/selection", post(selection_handler))
        .route("/api/clear", post(clear_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(config: AppConfig, session: Session) -> Result<()> {
    let state = Arc::new(AppState::new(&config, session)?);
    let addr = config.server.addr();

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn index_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(state.page.clone())
}

async fn state_handler(State(state): State<Arc<AppState>>) -> Json<Snapshot> {
    Json(state.snapshot())
}

async fn selection_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectionRequest>,
) -> Result<Json<Snapshot>, ApiError> {
    let mut session = state.session();
    let kept = session
        .set_selection(&request.category, &request.names)
        .map_err(ApiError)?;
    debug!("{} names selected in {:?}", kept, request.category);
    Ok(Json(session.snapshot(&state.defaults)))
}

async fn clear_handler(State(state): State<Arc<AppState>>) -> Json<Snapshot> {
    let mut session = state.session();
    session.clear_preselection();
    Json(session.snapshot(&state.defaults))
}

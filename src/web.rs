use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::recommender::{self, Recommender};
use crate::store::{MusicGraph, SimilarRow, TrackRow};

#[derive(Error, Debug)]
pub enum Error {
    #[error("std::io error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct AppState {
    store: MusicGraph,
    recommender: Recommender,
}

impl AppState {
    pub fn new(store: MusicGraph, recommender: Recommender) -> Arc<Self> {
        Arc::new(Self { store, recommender })
    }
}

pub async fn serve(state: Arc<AppState>, port: u16) -> Result<(), Error> {
    let cors = if cfg!(debug_assertions) {
        info!("Permissive CORS policy for development");
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    let app = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/discover", post(discover))
        .route("/api/similar", post(similar))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;

    info!(port = port, "start listen");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    info!("shutdown signal");
}

async fn index() -> Html<&'static str> {
    Html(include_str!("page/index.html"))
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct DiscoverRequest {
    artist: Option<String>,
    playlist: Option<String>,
}

#[derive(Serialize)]
struct DiscoverResponse {
    songs: Vec<TrackRow>,
    narrative: String,
    fallback: bool,
}

#[derive(Debug, Deserialize)]
struct SimilarRequest {
    track: String,
}

#[derive(Serialize)]
struct SimilarResponse {
    songs: Vec<SimilarRow>,
    narrative: String,
    fallback: bool,
}

async fn discover(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DiscoverRequest>,
) -> Result<Json<DiscoverResponse>, StatusCode> {
    let songs = state
        .store
        .songs_by_characteristics(request.artist.as_deref(), request.playlist.as_deref())
        .await
        .map_err(|e| {
            error!("store error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let (narrative, fallback) = discover_narrative(
        &state.recommender,
        &songs,
        request.artist.as_deref(),
        request.playlist.as_deref(),
    )
    .await
    .map_err(|e| {
        error!("generation error: {}", e);
        StatusCode::BAD_GATEWAY
    })?;

    Ok(Json(DiscoverResponse {
        songs,
        narrative,
        fallback,
    }))
}

async fn similar(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SimilarRequest>,
) -> Result<Json<SimilarResponse>, StatusCode> {
    let track = request.track.trim();
    if track.is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let songs = state.store.similar_songs(track).await.map_err(|e| {
        error!("store error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let (narrative, fallback) = similar_narrative(&state.recommender, track, &songs)
        .await
        .map_err(|e| {
            error!("generation error: {}", e);
            StatusCode::BAD_GATEWAY
        })?;

    Ok(Json(SimilarResponse {
        songs,
        narrative,
        fallback,
    }))
}

// A search that comes back empty is the fallback trigger, never an error.
async fn discover_narrative(
    recommender: &Recommender,
    songs: &[TrackRow],
    artist: Option<&str>,
    playlist: Option<&str>,
) -> Result<(String, bool), recommender::Error> {
    if songs.is_empty() {
        let description = search_description(artist, playlist);
        let narrative = recommender.fallback_recommend(&description).await?;
        Ok((narrative, true))
    } else {
        let narrative = recommender.analyze(songs).await?;
        Ok((narrative, false))
    }
}

async fn similar_narrative(
    recommender: &Recommender,
    track: &str,
    songs: &[SimilarRow],
) -> Result<(String, bool), recommender::Error> {
    if songs.is_empty() {
        let narrative = recommender.fallback_similar(track).await?;
        Ok((narrative, true))
    } else {
        let narrative = recommender.analyze_similar(track, songs).await?;
        Ok((narrative, false))
    }
}

fn search_description(artist: Option<&str>, playlist: Option<&str>) -> String {
    let artist = artist
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("Any");
    let playlist = playlist
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("Any");
    format!("Artist: {}, Playlist Style: {}", artist, playlist)
}

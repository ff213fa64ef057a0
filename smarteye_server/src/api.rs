use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use inference_common::detection::{Detection, LabelCounts};
use inference_common::frame_times::FrameTimes;
use inference_common::video_meta::VideoMeta;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::state::AppState;
use crate::upload::{read_file_field, Upload};
use crate::video::process_video_upload;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
    pub labels: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageResponse {
    pub detected_objects: Vec<Detection>,
    pub label_counts: LabelCounts,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RealtimeResponse {
    pub detections: Vec<Detection>,
    pub label_counts: LabelCounts,
}

pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/detect_image", post(detect_image))
        .route("/api/detect_video", post(detect_video))
        .route("/api/detect_realtime", post(detect_realtime))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        model: state.detector.name().to_string(),
        labels: state.detector.num_labels(),
    })
}

/// Decodes an uploaded image and runs it through the detector on the blocking pool.
async fn detect_upload(state: &AppState, upload: Upload) -> Result<Vec<Detection>, AppError> {
    let detector = Arc::clone(&state.detector);
    tokio::task::spawn_blocking(move || {
        let image = image::load_from_memory(&upload.bytes)
            .map_err(|e| AppError::Decode(format!("Failed to decode image: {e}")))?;
        let mut frame_times = FrameTimes::default();
        let detections = detector.detect(&image, &mut frame_times)?;
        debug!(
            "{}x{} image: {} detections, {frame_times:?}",
            image.width(),
            image.height(),
            detections.len()
        );
        Ok(detections)
    })
    .await?
}

async fn detect_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ImageResponse>, AppError> {
    let upload = read_file_field(multipart?, "image").await?;
    let detected_objects = detect_upload(&state, upload).await?;
    let label_counts = LabelCounts::from_detections(&detected_objects);
    Ok(Json(ImageResponse {
        detected_objects,
        label_counts,
    }))
}

async fn detect_realtime(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<RealtimeResponse>, AppError> {
    let upload = read_file_field(multipart?, "image").await?;
    let detections = detect_upload(&state, upload).await?;
    let label_counts = LabelCounts::from_detections(&detections);
    Ok(Json(RealtimeResponse {
        detections,
        label_counts,
    }))
}

async fn detect_video(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VideoMeta>, AppError> {
    let upload = read_file_field(multipart?, "video").await?;
    let detector = Arc::clone(&state.detector);
    let every = state.sample_every;
    let scratch_dir = state.scratch_dir.clone();

    let start = Instant::now();
    let video_meta = tokio::task::spawn_blocking(move || {
        process_video_upload(detector.as_ref(), &upload, every, scratch_dir.as_deref())
    })
    .await??;
    info!(
        "Video done in {:?}: {} of {} frames sampled, {} objects",
        start.elapsed(),
        video_meta.total_frames_processed,
        video_meta.frames_decoded,
        video_meta.label_counts.total()
    );
    Ok(Json(video_meta))
}

pub async fn serve(state: AppState, config: &ServerConfig) -> anyhow::Result<()> {
    let app = create_router(state, config.max_upload_bytes);

    let addr = config.bind_addr();
    info!("REST API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}

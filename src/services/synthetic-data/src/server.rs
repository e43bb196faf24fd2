//! HTTP surface over the generator: form upload in, CSV artifact out.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Result, SyntheticDataError};
use crate::fakers;
use crate::ingest::{self, SourceFormat};
use crate::interpreter;
use crate::orchestrator::{GenerationStrategy, Orchestrator};
use crate::output::{self, CsvPreview};
use crate::schema::CustomSchema;
use crate::types::{Category, GenerationRequest};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    requests_served: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            requests_served: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Seed for the next generation request.
    ///
    /// With a configured seed, request `n` uses stream `n` of it, so a
    /// restarted service replays the same sequence of datasets while no two
    /// requests share one.
    pub fn next_seed(&self) -> Option<u64> {
        let stream = self.requests_served.fetch_add(1, Ordering::Relaxed);
        self.config
            .seed
            .map(|base| fakers::derive_seed(base, stream))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub agent_messages: Vec<String>,
    pub filename: String,
    pub records_generated: usize,
    pub used_file_analysis: bool,
    pub strategy: GenerationStrategy,
    pub category: Category,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewResponse {
    pub filename: String,
    pub preview: CsvPreview,
}

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health_check))
        .route("/generate", post(generate))
        .route("/download/:filename", get(download))
        .route("/preview/:filename", get(preview))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl+C
pub async fn serve(config: Config) -> Result<()> {
    std::fs::create_dir_all(&config.output_dir)?;

    let addr = config.bind_address();
    let app = create_router(AppState::new(config));
    let listener = TcpListener::bind(&addr).await?;
    info!("Synthetic data service listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Synthetic data service shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install CTRL+C signal handler: {}", e);
    }
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

#[derive(Debug, Default)]
struct GenerateForm {
    request: Option<String>,
    records: Option<String>,
    schema: Option<String>,
    upload: Option<(String, Bytes)>,
}

async fn read_generate_form(mut multipart: Multipart) -> Result<GenerateForm> {
    let mut form = GenerateForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        SyntheticDataError::Validation(format!("Failed to read multipart field: {}", e))
    })? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "dataFile" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(|e| {
                    SyntheticDataError::Validation(format!("Failed to read uploaded file: {}", e))
                })?;
                // browsers send an empty part when no file is chosen
                if !file_name.is_empty() && !data.is_empty() {
                    form.upload = Some((file_name, data));
                }
            }
            "request" | "records" | "schema" => {
                let text = field.text().await.map_err(|e| {
                    SyntheticDataError::Validation(format!("Failed to read field '{}': {}", name, e))
                })?;
                let value = Some(text.trim().to_string()).filter(|v| !v.is_empty());
                match name.as_str() {
                    "request" => form.request = value,
                    "records" => form.records = value,
                    _ => form.schema = value,
                }
            }
            other => debug!("Ignoring unknown form field '{}'", other),
        }
    }

    Ok(form)
}

async fn generate(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<GenerateResponse>> {
    let form = read_generate_form(multipart).await?;

    let request_text = form.request.ok_or_else(|| {
        SyntheticDataError::Validation("Please provide a data generation request".to_string())
    })?;
    let mut request = GenerationRequest::new(request_text);
    if let Some(raw) = form.records {
        let count: u32 = raw.parse().map_err(|_| {
            SyntheticDataError::Validation(format!("Invalid record count: {}", raw))
        })?;
        if count == 0 {
            return Err(SyntheticDataError::Validation(
                "Record count must be at least 1".to_string(),
            ));
        }
        request = request.with_count(count);
    }

    let custom_schema = form
        .schema
        .as_deref()
        .map(CustomSchema::from_json)
        .transpose()?;

    let text = request.effective_text();
    let plan = interpreter::interpret(&text);
    if plan.record_count > state.config.max_records {
        return Err(SyntheticDataError::Validation(format!(
            "Requested {} records; the maximum is {}",
            plan.record_count, state.config.max_records
        )));
    }

    let mut agent_messages = Vec::new();
    let pattern_summary = match form.upload {
        Some((file_name, data)) => {
            SourceFormat::from_file_name(&file_name)?;
            agent_messages.push(format!("Analyzing uploaded file: {}", file_name));
            match ingest::analyze_upload(&file_name, &data) {
                Ok(summary) => {
                    agent_messages.push(format!(
                        "Learned patterns from {} columns across {} rows",
                        summary.columns.len(),
                        summary.row_count
                    ));
                    Some(summary)
                }
                Err(e) => {
                    warn!("File analysis failed for {}: {}", file_name, e);
                    agent_messages.push(format!(
                        "Could not analyze {}: {}. Continuing without it.",
                        file_name, e
                    ));
                    None
                }
            }
        }
        None => None,
    };
    let used_file_analysis = pattern_summary.is_some();

    let seed = state.next_seed();
    let output_dir = state.config.output_dir.clone();
    let (dataset, filename) = tokio::task::spawn_blocking(move || -> Result<_> {
        let orchestrator = Orchestrator::with_reference_time(Utc::now());
        let mut rng = fakers::seeded_rng(seed);
        let dataset = orchestrator.generate(
            &text,
            custom_schema.as_ref(),
            pattern_summary.as_ref(),
            &mut rng,
        )?;
        let filename = output::artifact_file_name(dataset.len(), Uuid::new_v4());
        output::write_csv(&dataset.records, &output_dir.join(&filename))?;
        Ok((dataset, filename))
    })
    .await
    .map_err(|e| SyntheticDataError::Internal(format!("Generation task failed: {}", e)))??;

    agent_messages.push(match dataset.strategy {
        GenerationStrategy::LearnedPatterns => format!(
            "Generated {} records using patterns learned from your file",
            dataset.len()
        ),
        GenerationStrategy::CustomSchema => format!(
            "Generated {} records using your custom schema",
            dataset.len()
        ),
        GenerationStrategy::Template => format!(
            "Generated {} {} records",
            dataset.len(),
            dataset.plan.category
        ),
    });

    info!(
        "Generated {} records with strategy {} into {}",
        dataset.len(),
        dataset.strategy,
        filename
    );

    Ok(Json(GenerateResponse {
        success: true,
        agent_messages,
        filename,
        records_generated: dataset.len(),
        used_file_analysis,
        strategy: dataset.strategy,
        category: dataset.plan.category,
    }))
}

async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response> {
    let path = output::resolve_artifact(&state.config.output_dir, &filename)?;
    let data = tokio::fs::read(&path).await?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
            .map_err(|e| SyntheticDataError::Internal(format!("Invalid header value: {}", e)))?,
    );

    debug!("Serving download {} ({} bytes)", filename, data.len());
    Ok((StatusCode::OK, headers, data).into_response())
}

async fn preview(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<PreviewResponse>> {
    let path = output::resolve_artifact(&state.config.output_dir, &filename)?;
    let preview = output::preview_csv(&path, state.config.preview_rows)?;
    Ok(Json(PreviewResponse { filename, preview }))
}

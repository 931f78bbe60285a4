use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use include_dir::{include_dir, Dir};
use parking_lot::{Mutex, RwLock};
use serde_json::json;
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;
use uuid::Uuid;
use chrono::Utc;

use crate::{
    ark::{ArkClient, GenerationBackend, redact_key},
    config::Config,
    intake::{product_from_request, IntakeError, MAX_IMAGE_BYTES},
    models::{
        DetailPageRun, GenerateRequest, GeneratedAssets, GenerationStatus, ProductInfo, RunCreated, RunSnapshot,
        RunState,
    },
    orchestrator::generate_assets,
    pdf::{generate_pdf, PdfExportError},
    render::render_detail_page,
};

static STATIC_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static");

pub const API_KEY_HEADER: &str = "x-ark-api-key";

/// Base64 of the largest accepted image plus room for the other form fields.
pub const MAX_REQUEST_BYTES: usize = MAX_IMAGE_BYTES.div_ceil(3) * 4 + 64 * 1024;

/// Builds the remote backend for one run from the operator's key.
pub type BackendFactory = Arc<dyn Fn(String) -> Arc<dyn GenerationBackend> + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    pub runs: Arc<RwLock<HashMap<Uuid, DetailPageRun>>>,
    /// Id of the run currently generating; at most one at a time.
    pub active_run: Arc<Mutex<Option<Uuid>>>,
    pub config: Arc<Config>,
    pub backends: BackendFactory,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let http = reqwest::Client::new();
        let shared = Arc::new(config);
        let factory_config = shared.clone();
        let backends: BackendFactory = Arc::new(move |api_key: String| {
            Arc::new(ArkClient::new(http.clone(), &factory_config, api_key)) as Arc<dyn GenerationBackend>
        });
        Self::with_backends(shared, backends)
    }

    pub fn with_backends(config: Arc<Config>, backends: BackendFactory) -> Self {
        Self {
            runs: Arc::default(),
            active_run: Arc::default(),
            config,
            backends,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error("API Key缺失，请在页面中输入或配置ARK_API_KEY")]
    MissingApiKey,
    #[error("已有生成任务正在进行，请稍候")]
    RunInProgress,
    #[error("未找到该详情页")]
    NotFound,
    #[error("详情页尚未生成完成")]
    NotReady,
    #[error(transparent)]
    Pdf(#[from] PdfExportError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Intake(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingApiKey => StatusCode::UNAUTHORIZED,
            ApiError::RunInProgress | ApiError::NotReady => StatusCode::CONFLICT,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Pdf(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/detail-page", post(create_detail_page))
        .route("/api/detail-page/:id", get(get_detail_page))
        .route("/api/detail-page/:id/html", get(detail_page_html))
        .route("/api/detail-page/:id/pdf", get(export_pdf))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .with_state(state)
}

pub async fn index() -> Response {
    match STATIC_DIR.get_file("index.html").and_then(|f| f.contents_utf8()) {
        Some(page) => Html(page).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Header key first (`X-Ark-Api-Key` or `Authorization: Bearer`), then the configured one.
fn resolve_api_key(headers: &HeaderMap, config: &Config) -> Option<String> {
    let from_header = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
        })
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);
    from_header.or_else(|| config.api_key.clone())
}

/// Clears the active-run slot when the run ends, however it ends.
struct ActiveRunGuard {
    slot: Arc<Mutex<Option<Uuid>>>,
}

impl Drop for ActiveRunGuard {
    fn drop(&mut self) {
        *self.slot.lock() = None;
    }
}

fn claim_active_run(slot: &Arc<Mutex<Option<Uuid>>>, id: Uuid) -> Option<ActiveRunGuard> {
    let mut active = slot.lock();
    if active.is_some() {
        return None;
    }
    *active = Some(id);
    Some(ActiveRunGuard { slot: slot.clone() })
}

pub async fn create_detail_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<RunCreated>), ApiError> {
    let api_key = resolve_api_key(&headers, &state.config).ok_or(ApiError::MissingApiKey)?;
    let product = product_from_request(body)?;

    let id = Uuid::new_v4();
    let guard = claim_active_run(&state.active_run, id).ok_or(ApiError::RunInProgress)?;

    tracing::info!("🚀 Starting detail page run {} for '{}' (key {})", id, product.title, redact_key(&api_key));
    let now = Utc::now();
    state.runs.write().insert(id, DetailPageRun {
        id,
        product: product.clone(),
        state: RunState::Generating { status: GenerationStatus { step: "准备中...".into(), progress: 0 } },
        created_at: now,
        updated_at: now,
    });

    let backend = (state.backends)(api_key);
    let retain = state.config.max_retained_runs;
    tokio::spawn(run_generation(state.runs.clone(), id, product, backend, guard, retain));

    Ok((StatusCode::ACCEPTED, Json(RunCreated { id })))
}

async fn run_generation(
    runs: Arc<RwLock<HashMap<Uuid, DetailPageRun>>>,
    id: Uuid,
    product: ProductInfo,
    backend: Arc<dyn GenerationBackend>,
    _guard: ActiveRunGuard,
    retain: usize,
) {
    let progress_runs = runs.clone();
    let on_progress = move |status: GenerationStatus| {
        if let Some(run) = progress_runs.write().get_mut(&id) {
            run.state = RunState::Generating { status };
            run.updated_at = Utc::now();
        }
    };

    let outcome = generate_assets(backend.as_ref(), &product, on_progress).await;

    let state = match outcome {
        Ok(assets) => {
            tracing::info!("✅ Run {} completed", id);
            RunState::Completed { assets }
        }
        Err(e) => {
            tracing::error!("❌ Run {} failed: {}", id, e);
            RunState::Failed { error: e.to_string() }
        }
    };
    let mut runs = runs.write();
    if let Some(run) = runs.get_mut(&id) {
        run.state = state;
        run.updated_at = Utc::now();
    }
    let evicted = prune_finished_runs(&mut runs, retain);
    if evicted > 0 {
        tracing::info!("🧹 Dropped {} finished run(s); keeping the latest {}", evicted, retain);
    }
}

/// Drops the oldest finished runs until at most `keep` remain. Generating runs are never touched.
fn prune_finished_runs(runs: &mut HashMap<Uuid, DetailPageRun>, keep: usize) -> usize {
    let mut finished: Vec<(chrono::DateTime<Utc>, Uuid)> = runs
        .values()
        .filter(|run| !matches!(run.state, RunState::Generating { .. }))
        .map(|run| (run.updated_at, run.id))
        .collect();
    if finished.len() <= keep {
        return 0;
    }
    finished.sort_unstable();
    let excess = finished.len() - keep;
    for (_, id) in finished.into_iter().take(excess) {
        runs.remove(&id);
    }
    excess
}

pub async fn get_detail_page(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<Json<RunSnapshot>, ApiError> {
    state.runs.read().get(&id).map(|run| Json(RunSnapshot::from(run))).ok_or(ApiError::NotFound)
}

/// Snapshot of a completed run, taken without holding the lock while rendering.
fn completed_run(state: &AppState, id: Uuid) -> Result<(ProductInfo, GeneratedAssets), ApiError> {
    let runs = state.runs.read();
    let run = runs.get(&id).ok_or(ApiError::NotFound)?;
    let assets = run.assets().ok_or(ApiError::NotReady)?;
    Ok((run.product.clone(), assets.clone()))
}

pub async fn detail_page_html(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let (product, assets) = completed_run(&state, id)?;
    Ok(Html(render_detail_page(&product, &assets)))
}

pub async fn export_pdf(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<Response, ApiError> {
    let (product, assets) = completed_run(&state, id)?;
    let pdf_bytes = generate_pdf(&product, &assets, state.config.pdf_font_path.as_deref())?;
    tracing::info!("📄 Exported PDF for run {} ({} bytes)", id, pdf_bytes.len());
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"detail_page_{}.pdf\"", id)),
        ],
        pdf_bytes,
    )
        .into_response())
}

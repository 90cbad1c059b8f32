use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meli_shipping_rs::types::LineQuote;
use meli_shipping_rs::{
    MeliClient, MeliConfig, QuoteError, normalize_listing_id, normalize_zip_code,
};

/// Server configuration
struct ServerConfig {
    port: u16,
    api_url: Option<String>,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            api_url: env::var("MELI_API_URL").ok(),
        }
    }
}

/// Application state shared across all requests
#[derive(Clone)]
struct AppState {
    client: Arc<MeliClient>,
    metrics: Arc<Metrics>,
}

/// Server metrics
struct Metrics {
    total_requests: AtomicU64,
    requests_in_flight: AtomicU64,
    start_time: Instant,
}

/// RAII guard for tracking in-flight requests
struct RequestGuard<'a>(&'a AtomicU64);

impl<'a> Drop for RequestGuard<'a> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Read configuration from environment
    let config = ServerConfig::from_env();

    let mut meli_config = MeliConfig::default();
    if let Some(api_url) = config.api_url.clone() {
        meli_config.base_url = api_url;
    }

    // Initialize the shared quote client (one connection pool for all requests)
    let client = Arc::new(
        MeliClient::with_config(meli_config)
            .context("Failed to initialize Mercado Livre client")?,
    );
    tracing::info!("Quote client initialized");

    // Build Axum app with routes
    let app = build_app(client);

    // Bind server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Build the Axum application with routes and middleware
fn build_app(client: Arc<MeliClient>) -> Router {
    let metrics = Arc::new(Metrics {
        total_requests: AtomicU64::new(0),
        requests_in_flight: AtomicU64::new(0),
        start_time: Instant::now(),
    });

    let state = AppState { client, metrics };

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // API routes
        .route("/api/quote", post(quote_single))
        .route("/api/quote/batch", post(quote_batch))
        .route("/api/metrics", get(get_metrics))
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Quote shipping for a single listing
async fn quote_single(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequestBody>,
) -> Result<Json<QuoteResponse>, ApiError> {
    // Increment metrics
    state.metrics.total_requests.fetch_add(1, Ordering::Relaxed);
    state
        .metrics
        .requests_in_flight
        .fetch_add(1, Ordering::Relaxed);

    // Ensure we decrement on exit
    let _guard = RequestGuard(&state.metrics.requests_in_flight);

    let prefix = &state.client.config().default_prefix;
    let listing_id = normalize_listing_id(&request.listing_id, prefix)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let zip_code =
        normalize_zip_code(&request.zip_code).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    tracing::info!("Quoting shipping for {} to ZIP {}", listing_id, zip_code);

    let quote = state
        .client
        .shipping_quote(&listing_id, &zip_code)
        .await
        .map_err(|e| {
            tracing::error!("Quote error for {}: {}", listing_id, e);
            ApiError::from_quote(e)
        })?;

    Ok(Json(QuoteResponse {
        success: true,
        data: QuoteData {
            listing_id: listing_id.to_string(),
            cost: quote.cost,
            currency_id: quote.currency_id,
            option_name: quote.option_name,
        },
    }))
}

#[derive(Deserialize)]
struct QuoteRequestBody {
    listing_id: String,
    zip_code: String,
}

#[derive(Serialize)]
struct QuoteResponse {
    success: bool,
    data: QuoteData,
}

#[derive(Serialize)]
struct QuoteData {
    listing_id: String,
    cost: f64,
    currency_id: Option<String>,
    option_name: Option<String>,
}

/// Quote shipping for multiple listings (batch)
///
/// Per-item failures stay inline in the payload so partial success is always
/// visible; only input-level problems produce an HTTP error.
async fn quote_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchQuoteRequest>,
) -> Result<Json<BatchQuoteResponse>, ApiError> {
    state.metrics.total_requests.fetch_add(1, Ordering::Relaxed);
    state
        .metrics
        .requests_in_flight
        .fetch_add(1, Ordering::Relaxed);
    let _guard = RequestGuard(&state.metrics.requests_in_flight);

    let batch = state
        .client
        .parse_batch(&request.listing_ids, &request.zip_code)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    if batch.is_empty() {
        return Err(ApiError::BadRequest(
            "listing_ids cannot be empty".to_string(),
        ));
    }

    tracing::info!("Batch quoting {} listing(s)", batch.len());

    let results = state.client.quote_batch(batch).await;
    let data = results.iter().map(LineQuoteData::from_line_quote).collect();

    Ok(Json(BatchQuoteResponse {
        success: true,
        data,
    }))
}

#[derive(Deserialize)]
struct BatchQuoteRequest {
    /// Free-form id input: comma- or newline-separated, bare numbers allowed.
    listing_ids: String,
    zip_code: String,
}

#[derive(Serialize)]
struct BatchQuoteResponse {
    success: bool,
    data: Vec<LineQuoteData>,
}

/// Per-line outcome in the batch payload
#[derive(Serialize)]
struct LineQuoteData {
    input: String,
    listing_id: Option<String>,
    cost: Option<f64>,
    currency_id: Option<String>,
    option_name: Option<String>,
    error: Option<String>,
}

impl LineQuoteData {
    fn from_line_quote(line: &LineQuote) -> Self {
        let listing_id = line.listing_id.as_ref().map(|id| id.to_string());
        match &line.outcome {
            Ok(quote) => Self {
                input: line.raw.clone(),
                listing_id,
                cost: Some(quote.cost),
                currency_id: quote.currency_id.clone(),
                option_name: quote.option_name.clone(),
                error: None,
            },
            Err(err) => Self {
                input: line.raw.clone(),
                listing_id,
                cost: None,
                currency_id: None,
                option_name: None,
                error: Some(err.to_string()),
            },
        }
    }
}

/// Get server metrics
async fn get_metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        total_requests: state.metrics.total_requests.load(Ordering::Relaxed),
        requests_in_flight: state.metrics.requests_in_flight.load(Ordering::Relaxed),
        uptime_seconds: state.metrics.start_time.elapsed().as_secs(),
    })
}

#[derive(Serialize)]
struct MetricsResponse {
    total_requests: u64,
    requests_in_flight: u64,
    uptime_seconds: u64,
}

/// API error types
enum ApiError {
    BadRequest(String),
    NotFound(String),
    Upstream(String),
}

impl ApiError {
    /// Map a per-item quote error onto the single-quote endpoint's status.
    fn from_quote(err: QuoteError) -> Self {
        match err {
            QuoteError::InvalidIdentifier(_) | QuoteError::InvalidZip(_) => {
                ApiError::BadRequest(err.to_string())
            }
            QuoteError::Api { status: 404, .. } => ApiError::NotFound(err.to_string()),
            _ => ApiError::Upstream(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(serde_json::json!({
            "success": false,
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

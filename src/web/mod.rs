pub mod extractors;
pub mod handlers;
pub mod middleware;

use crate::{models::ModelManager, utils::error::DetectError, Config, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
};

/// 注入到各处理器的上下文
#[derive(Clone)]
pub struct AppState {
    pub models: Arc<ModelManager>,
}

impl AppState {
    pub fn new(models: Arc<ModelManager>) -> Self {
        Self { models }
    }
}

pub async fn serve(config: Config) -> Result<()> {
    let models = Arc::new(ModelManager::new(config.clone()));
    let app = create_app(AppState::new(Arc::clone(&models)))?;

    // 解析绑定地址
    let addr: SocketAddr = config.bind_addr.parse().map_err(|e| {
        DetectError::Config(format!("Invalid bind address {}: {}", config.bind_addr, e))
    })?;

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        DetectError::Internal(format!("Failed to bind to address {}: {}", addr, e))
    })?;

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  POST /predict   - Multipart image upload");
    tracing::info!("  GET  /health    - Health check");
    tracing::info!("  GET  /api/info  - Service information");

    // 监听已就绪后再加载模型，加载期间 /health 报告 model_loaded=false
    let (failed_tx, failed_rx) = oneshot::channel();
    tokio::spawn(async move {
        match tokio::task::spawn_blocking(move || models.load()).await {
            Ok(Ok(())) => tracing::info!("Model loaded, service ready"),
            Ok(Err(e)) => {
                let _ = failed_tx.send(e);
            }
            Err(e) => {
                let _ = failed_tx.send(DetectError::ModelLoad(format!(
                    "Model loading task failed: {}",
                    e
                )));
            }
        }
    });

    let load_failure = Arc::new(Mutex::new(None));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(failed_rx, Arc::clone(&load_failure)))
        .await
        .map_err(|e| DetectError::Internal(format!("Server failed: {}", e)))?;

    // 模型加载失败时不对外提供服务
    if let Some(err) = load_failure.lock().take() {
        return Err(err);
    }

    tracing::info!("Server stopped");
    Ok(())
}

/// Ctrl-C或模型加载失败时返回
async fn shutdown_signal(
    load_failed: oneshot::Receiver<DetectError>,
    failure: Arc<Mutex<Option<DetectError>>>,
) {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, shutting down");
        }
        result = load_failed => {
            match result {
                Ok(err) => {
                    tracing::error!("Model failed to load, shutting down: {}", err);
                    *failure.lock() = Some(err);
                }
                // 发送端被丢弃说明加载成功
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    tracing::info!("Received Ctrl-C, shutting down");
                }
            }
        }
    }
}

pub fn create_app(state: AppState) -> Result<Router> {
    let config = state.models.config();
    let max_request_size = config.server_config.max_request_size;
    let request_timeout = Duration::from_secs(config.server_config.request_timeout);
    let cors = cors_layer(&config.cors_origins)?;

    let app = Router::new()
        .route("/predict", post(handlers::predict_handler))
        .route("/health", get(handlers::health_handler))
        .route("/api/info", get(handlers::info_handler))
        // multipart默认限制2MB，改由RequestBodyLimitLayer统一限制
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_request_size))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
        .layer(axum::middleware::from_fn(middleware::request_logging))
        .with_state(state);

    Ok(app)
}

/// 来源列表为空或包含"*"时放开所有来源
fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return Ok(CorsLayer::permissive());
    }

    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o)
                .map_err(|e| DetectError::Config(format!("Invalid CORS origin {}: {}", o, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any))
}

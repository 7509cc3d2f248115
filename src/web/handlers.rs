use crate::{
    diagnosis::{resolve_patient_id, DiagnosisPipeline, PredictionResponse},
    utils::error::DetectError,
    web::{
        extractors::{LoadedModel, PredictUpload, RequestId},
        AppState,
    },
    Result,
};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::json;
use std::time::Instant;

/// /predict 的查询参数。表单中的patient_id优先
#[derive(Debug, Default, Deserialize)]
pub struct PredictQuery {
    #[serde(default)]
    pub patient_id: Option<String>,
}

/// 上传图像并返回肿瘤判定
pub async fn predict_handler(
    RequestId(request_id): RequestId,
    LoadedModel(classifier): LoadedModel,
    State(state): State<AppState>,
    query: std::result::Result<Query<PredictQuery>, QueryRejection>,
    upload: PredictUpload,
) -> Result<Json<PredictionResponse>> {
    let start_time = Instant::now();
    let Query(query) = query
        .map_err(|e| DetectError::InvalidInput(format!("Invalid query string: {}", e.body_text())))?;
    let patient_id = resolve_patient_id(upload.patient_id.or(query.patient_id));

    tracing::info!(
        "Processing prediction: request_id={}, patient_id={}, file={:?}, bytes={}",
        request_id,
        patient_id,
        upload.file_name,
        upload.file.len()
    );

    let threshold = state.models.config().threshold;
    let result = DiagnosisPipeline::process_bytes(classifier, upload.file, threshold).await?;

    tracing::info!(
        "Prediction completed: request_id={}, patient_id={}, prediction={}, confidence={:.4}, time={:.3}s",
        request_id,
        patient_id,
        result.label,
        result.confidence,
        start_time.elapsed().as_secs_f32()
    );

    Ok(Json(PredictionResponse::new(patient_id, result)))
}

/// 健康检查端点
pub async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "model_loaded": state.models.is_loaded(),
    }))
}

/// 服务信息端点
pub async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "service": "Tumor Detection Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "model": state.models.get_stats(),
    }))
}

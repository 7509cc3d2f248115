use crate::models::{Label, PredictionResult};
use serde::Serialize;

/// /predict 的响应体
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResponse {
    pub patient_id: String,
    pub prediction: Label,
    pub confidence: f32,
    pub has_tumor: bool,
    pub message: String,
}

impl PredictionResponse {
    pub fn new(patient_id: String, result: PredictionResult) -> Self {
        Self {
            patient_id,
            prediction: result.label,
            confidence: result.confidence,
            has_tumor: result.has_tumor(),
            message: Self::message(&result),
        }
    }

    /// 置信度以百分比显示，保留两位小数
    pub fn message(result: &PredictionResult) -> String {
        let percent = result.confidence * 100.0;
        match result.label {
            Label::Tumor => format!("Tumor detected with {:.2}% confidence", percent),
            Label::NoTumor => format!("No tumor detected ({:.2}% confidence)", percent),
        }
    }
}

/// 未提供病人ID时生成UUID v4，否则原样返回
pub fn resolve_patient_id(supplied: Option<String>) -> String {
    match supplied {
        Some(id) if !id.is_empty() => id,
        _ => uuid::Uuid::new_v4().to_string(),
    }
}

use crate::models::Classifier;
use crate::utils::error::DetectError;
use crate::web::AppState;
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Multipart, Request},
    http::request::Parts,
};
use std::sync::Arc;

/// 已加载的模型。未加载时在读取请求体之前就返回503
pub struct LoadedModel(pub Arc<Classifier>);

#[async_trait]
impl FromRequestParts<AppState> for LoadedModel {
    type Rejection = DetectError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        state.models.classifier().map(LoadedModel)
    }
}

/// /predict 的multipart表单
#[derive(Debug)]
pub struct PredictUpload {
    pub file: Bytes,
    pub file_name: Option<String>,
    pub patient_id: Option<String>,
}

#[async_trait]
impl<S> FromRequest<S> for PredictUpload
where
    S: Send + Sync,
{
    type Rejection = DetectError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| DetectError::InvalidInput(format!("Expected multipart form data: {}", e)))?;

        let mut file = None;
        let mut file_name = None;
        let mut patient_id = None;

        // 解析multipart数据
        while let Some(field) = multipart.next_field().await.map_err(|e| {
            DetectError::InvalidInput(format!("Failed to read multipart field: {}", e))
        })? {
            let field_name = field.name().unwrap_or("unknown").to_string();

            match field_name.as_str() {
                "file" => {
                    file_name = field.file_name().map(|s| s.to_string());
                    let data = field.bytes().await.map_err(|e| {
                        DetectError::InvalidInput(format!("Failed to read file data: {}", e))
                    })?;
                    tracing::debug!("Received file: {} bytes", data.len());
                    file = Some(data);
                }
                "patient_id" => {
                    let value = field.text().await.map_err(|e| {
                        DetectError::InvalidInput(format!("Failed to read patient_id: {}", e))
                    })?;
                    patient_id = Some(value);
                }
                _ => {
                    tracing::debug!("Ignoring unknown field: {}", field_name);
                }
            }
        }

        let file = file.ok_or_else(|| {
            DetectError::InvalidInput("No image file provided in field 'file'".to_string())
        })?;

        Ok(PredictUpload {
            file,
            file_name,
            patient_id,
        })
    }
}

/// 请求ID提取器
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = parts
            .headers
            .get("X-Request-ID")
            .and_then(|value| value.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Ok(RequestId(request_id))
    }
}

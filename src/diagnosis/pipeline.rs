use crate::{
    image::ImagePreprocessor,
    models::{Classifier, PredictionResult},
    utils::error::DetectError,
    Result,
};
use axum::body::Bytes;
use std::sync::Arc;
use std::time::Instant;

/// 诊断流水线：预处理 -> 推理
pub struct DiagnosisPipeline;

impl DiagnosisPipeline {
    /// 处理上传的图像字节。CPU密集部分在阻塞线程池中运行
    pub async fn process_bytes(
        classifier: Arc<Classifier>,
        bytes: Bytes,
        threshold: f32,
    ) -> Result<PredictionResult> {
        tokio::task::spawn_blocking(move || Self::run(&classifier, &bytes, threshold))
            .await
            .map_err(|e| DetectError::Internal(format!("Inference task failed: {}", e)))?
    }

    /// 同步执行完整流水线
    pub fn run(classifier: &Classifier, bytes: &[u8], threshold: f32) -> Result<PredictionResult> {
        let start_time = Instant::now();

        let tensor = ImagePreprocessor::preprocess(bytes)?;
        let preprocess_time = start_time.elapsed();

        let result = classifier.classify(tensor, threshold)?;

        tracing::debug!(
            "Pipeline finished: label={}, confidence={:.4}, preprocess={:.3}s, total={:.3}s",
            result.label,
            result.confidence,
            preprocess_time.as_secs_f32(),
            start_time.elapsed().as_secs_f32()
        );

        Ok(result)
    }
}

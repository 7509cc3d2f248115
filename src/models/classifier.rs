use crate::config::OnnxConfig;
use crate::image::NormalizedTensor;
use crate::models::OnnxBackend;
use crate::utils::error::DetectError;
use crate::Result;
use ndarray::{Array4, ArrayD, ArrayViewD, Axis};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// 推理后端：输入(1, 224, 224, 3)，返回模型原始输出
pub trait InferenceBackend: Send + Sync {
    fn run(&self, input: Array4<f32>) -> Result<ArrayD<f32>>;

    /// 用于日志和服务信息的后端描述
    fn describe(&self) -> String;
}

/// 模型输出向量中各标签的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutputLayout {
    pub no_tumor_index: usize,
    pub tumor_index: usize,
}

impl Default for OutputLayout {
    /// 训练产物的约定：[p_no_tumor, p_tumor]
    fn default() -> Self {
        Self {
            no_tumor_index: 0,
            tumor_index: 1,
        }
    }
}

impl OutputLayout {
    pub fn with_tumor_index(tumor_index: usize) -> Result<Self> {
        match tumor_index {
            0 => Ok(Self {
                no_tumor_index: 1,
                tumor_index: 0,
            }),
            1 => Ok(Self::default()),
            other => Err(DetectError::InvalidInput(format!(
                "Tumor index must be 0 or 1 for a two-class model, got {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Label {
    #[serde(rename = "Tumor")]
    Tumor,
    #[serde(rename = "No Tumor")]
    NoTumor,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Tumor => write!(f, "Tumor"),
            Label::NoTumor => write!(f, "No Tumor"),
        }
    }
}

/// 分类结果。confidence始终是返回标签的概率，不做截断
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionResult {
    pub label: Label,
    pub confidence: f32,
}

impl PredictionResult {
    /// p_tumor >= threshold 判为肿瘤（包含边界）
    pub fn from_probabilities(
        probabilities: &[f32],
        layout: OutputLayout,
        threshold: f32,
    ) -> Result<Self> {
        if probabilities.len() < 2 {
            return Err(DetectError::Inference(format!(
                "Expected at least 2 class probabilities, got {}",
                probabilities.len()
            )));
        }

        let tumor_prob = *probabilities.get(layout.tumor_index).ok_or_else(|| {
            DetectError::Inference(format!(
                "Tumor probability index {} out of range for {} outputs",
                layout.tumor_index,
                probabilities.len()
            ))
        })?;

        if !tumor_prob.is_finite() {
            return Err(DetectError::Inference(format!(
                "Model produced a non-finite tumor probability: {}",
                tumor_prob
            )));
        }

        let result = if tumor_prob >= threshold {
            Self {
                label: Label::Tumor,
                confidence: tumor_prob,
            }
        } else {
            Self {
                label: Label::NoTumor,
                confidence: 1.0 - tumor_prob,
            }
        };

        Ok(result)
    }

    pub fn has_tumor(&self) -> bool {
        self.label == Label::Tumor
    }
}

/// 已加载的分类模型，加载后只读
pub struct Classifier {
    backend: Arc<dyn InferenceBackend>,
    layout: OutputLayout,
}

impl Classifier {
    pub fn new(backend: Arc<dyn InferenceBackend>, layout: OutputLayout) -> Self {
        Self { backend, layout }
    }

    /// 从ONNX文件加载模型
    pub fn load(path: &Path, onnx_config: &OnnxConfig, layout: OutputLayout) -> Result<Self> {
        let backend = OnnxBackend::load(path, onnx_config)?;
        Ok(Self::new(Arc::new(backend), layout))
    }

    pub fn layout(&self) -> OutputLayout {
        self.layout
    }

    pub fn describe(&self) -> String {
        self.backend.describe()
    }

    /// 对单张图像做二分类
    pub fn classify(&self, tensor: NormalizedTensor, threshold: f32) -> Result<PredictionResult> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(DetectError::InvalidInput(format!(
                "Threshold must be between 0.0 and 1.0, got {}",
                threshold
            )));
        }

        // 添加batch维度
        let input = tensor.into_inner().insert_axis(Axis(0));

        let output = self.backend.run(input)?;
        let probabilities = Self::first_row(&output.view())?;

        tracing::debug!(
            "Raw model output: {:?} (tumor_index={})",
            probabilities,
            self.layout.tumor_index
        );

        PredictionResult::from_probabilities(&probabilities, self.layout, threshold)
    }

    /// 取出batch中第一条样本的概率向量
    fn first_row(output: &ArrayViewD<f32>) -> Result<Vec<f32>> {
        match output.ndim() {
            1 => Ok(output.iter().copied().collect()),
            2 => {
                if output.shape()[0] == 0 {
                    return Err(DetectError::Inference("Model returned an empty batch".to_string()));
                }
                Ok(output.index_axis(Axis(0), 0).iter().copied().collect())
            }
            _ => Err(DetectError::Inference(format!(
                "Expected a 2D probability tensor, got shape {:?}",
                output.shape()
            ))),
        }
    }
}

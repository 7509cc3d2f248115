use crate::config::OnnxConfig;
use crate::models::InferenceBackend;
use crate::utils::error::DetectError;
use crate::Result;
use ndarray::{Array4, ArrayD};
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// ONNX Runtime会话。Session::run需要&mut，推理请求在锁上串行
pub struct OnnxBackend {
    session: Mutex<Session>,
    input_name: String,  // 动态发现的输入名称
    output_name: String, // 动态发现的输出名称
    model_path: PathBuf,
}

impl OnnxBackend {
    pub fn load(model_path: &Path, config: &OnnxConfig) -> Result<Self> {
        if !model_path.exists() {
            return Err(DetectError::ModelLoad(format!(
                "Classification model not found: {}",
                model_path.display()
            )));
        }

        tracing::info!("Loading classification model from: {}", model_path.display());

        let optimization_level = if config.enable_optimization {
            GraphOptimizationLevel::Level3
        } else {
            GraphOptimizationLevel::Disable
        };

        let session = Session::builder()
            .map_err(|e| DetectError::ModelLoad(e.to_string()))?
            .with_optimization_level(optimization_level)
            .map_err(|e| DetectError::ModelLoad(e.to_string()))?
            .with_intra_threads(config.intra_threads)
            .map_err(|e| DetectError::ModelLoad(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e| DetectError::ModelLoad(format!("{}: {}", model_path.display(), e)))?;

        let input_name = match session.inputs.first() {
            Some(input) => input.name.clone(),
            None => {
                return Err(DetectError::ModelLoad(
                    "Classification model has no inputs".to_string(),
                ))
            }
        };

        let output_name = match session.outputs.first() {
            Some(output) => output.name.clone(),
            None => {
                return Err(DetectError::ModelLoad(
                    "Classification model has no outputs".to_string(),
                ))
            }
        };

        tracing::info!(
            "Classification model ready: input='{}', output='{}'",
            input_name,
            output_name
        );
        // 记录所有可用输出用于调试
        for (i, output) in session.outputs.iter().enumerate() {
            tracing::debug!("Model output[{}]: '{}'", i, output.name);
        }

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            model_path: model_path.to_path_buf(),
        })
    }
}

impl InferenceBackend for OnnxBackend {
    fn run(&self, input: Array4<f32>) -> Result<ArrayD<f32>> {
        let input_tensor =
            Tensor::from_array(input).map_err(|e| DetectError::Inference(e.to_string()))?;

        // 在锁内提取数据，避免输出借用会话
        let prediction = {
            let mut session = self.session.lock();
            let outputs = session
                .run(inputs![self.input_name.as_str() => input_tensor])
                .map_err(|e| DetectError::Inference(e.to_string()))?;

            match outputs.get(&self.output_name) {
                Some(output) => output
                    .try_extract_array::<f32>()
                    .map_err(|e| DetectError::Inference(e.to_string()))?
                    .into_owned(),
                None => {
                    let available: Vec<String> = outputs.keys().map(|s| s.to_string()).collect();
                    return Err(DetectError::Inference(format!(
                        "Output '{}' not found. Available outputs: {:?}",
                        self.output_name, available
                    )));
                }
            }
        };

        Ok(prediction)
    }

    fn describe(&self) -> String {
        format!("onnx:{}", self.model_path.display())
    }
}

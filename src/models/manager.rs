use crate::image::preprocessing::{INPUT_CHANNELS, INPUT_SIZE};
use crate::models::{Classifier, OutputLayout};
use crate::utils::error::DetectError;
use crate::{Config, Result};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::sync::Arc;

/// 持有已加载模型的上下文，启动时写入一次，之后只读
pub struct ModelManager {
    classifier: OnceCell<Arc<Classifier>>,
    config: Config,
}

impl ModelManager {
    /// 创建尚未加载模型的管理器
    pub fn new(config: Config) -> Self {
        Self {
            classifier: OnceCell::new(),
            config,
        }
    }

    /// 从配置的路径加载模型。阻塞调用，应在阻塞线程池中执行
    pub fn load(&self) -> Result<()> {
        tracing::info!("Initializing model manager...");

        let classifier = Classifier::load(
            &self.config.model_path,
            &self.config.onnx_config,
            self.config.output_layout,
        )?;
        self.install(classifier)?;

        tracing::info!("Model manager initialized successfully");
        Ok(())
    }

    /// 安装已构建的分类器，只能成功一次
    pub fn install(&self, classifier: Classifier) -> Result<()> {
        self.classifier
            .set(Arc::new(classifier))
            .map_err(|_| DetectError::Internal("Model already loaded".to_string()))
    }

    /// 获取分类器引用，未加载时返回ServiceUnavailable
    pub fn classifier(&self) -> Result<Arc<Classifier>> {
        self.classifier
            .get()
            .cloned()
            .ok_or(DetectError::ServiceUnavailable)
    }

    pub fn is_loaded(&self) -> bool {
        self.classifier.get().is_some()
    }

    /// 获取配置引用
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 获取模型统计信息
    pub fn get_stats(&self) -> ModelStats {
        let classifier = self.classifier.get();
        ModelStats {
            loaded: classifier.is_some(),
            backend: classifier.map(|c| c.describe()),
            model_path: self.config.model_path.display().to_string(),
            input_shape: [1, INPUT_SIZE as usize, INPUT_SIZE as usize, INPUT_CHANNELS],
            threshold: self.config.threshold,
            output_layout: classifier
                .map(|c| c.layout())
                .unwrap_or(self.config.output_layout),
            intra_threads: self.config.onnx_config.intra_threads,
        }
    }
}

/// 模型统计信息
#[derive(Debug, Clone, Serialize)]
pub struct ModelStats {
    pub loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    pub model_path: String,
    pub input_shape: [usize; 4],
    pub threshold: f32,
    pub output_layout: OutputLayout,
    pub intra_threads: usize,
}

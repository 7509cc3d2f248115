use crate::models::OutputLayout;
use crate::utils::error::DetectError;
use crate::Result;
use std::path::PathBuf;

/// 默认判定阈值
pub const DEFAULT_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器绑定地址
    pub bind_addr: String,

    /// 分类模型文件路径
    pub model_path: PathBuf,

    /// 工作线程数量
    pub workers: usize,

    /// 开发模式
    pub dev_mode: bool,

    /// 肿瘤判定阈值
    pub threshold: f32,

    /// 模型输出中各标签的位置
    pub output_layout: OutputLayout,

    /// 允许的CORS来源，为空时放开所有来源
    pub cors_origins: Vec<String>,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,

    /// 服务器配置
    pub server_config: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,

    /// 启用图优化
    pub enable_optimization: bool,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 请求超时时间（秒）
    pub request_timeout: u64,

    /// 最大请求体大小（字节）
    pub max_request_size: usize,
}

impl Config {
    pub fn new(
        bind_addr: String,
        model_path: impl Into<PathBuf>,
        workers: Option<usize>,
        dev_mode: bool,
    ) -> Result<Self> {
        let cpu_cores = num_cpus::get();
        let workers = workers.unwrap_or(cpu_cores);
        if workers == 0 {
            return Err(DetectError::Config(
                "Worker count must be at least 1".to_string(),
            ));
        }

        let onnx_config = OnnxConfig {
            intra_threads: (cpu_cores * 3 / 4).max(1), // 使用75%的CPU核心
            enable_optimization: true,
        };

        let server_config = ServerConfig {
            request_timeout: if dev_mode { 300 } else { 60 }, // 开发模式更长超时
            max_request_size: 50 * 1024 * 1024,              // 50MB
        };

        Ok(Self {
            bind_addr,
            model_path: model_path.into(),
            workers,
            dev_mode,
            threshold: DEFAULT_THRESHOLD,
            output_layout: OutputLayout::default(),
            cors_origins: Vec::new(),
            onnx_config,
            server_config,
        })
    }

    /// 设置判定阈值，必须位于[0, 1]
    pub fn with_threshold(mut self, threshold: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(DetectError::Config(format!(
                "Threshold must be between 0.0 and 1.0, got {}",
                threshold
            )));
        }
        self.threshold = threshold;
        Ok(self)
    }

    /// 设置模型输出中肿瘤概率所在的下标
    pub fn with_tumor_index(mut self, tumor_index: usize) -> Result<Self> {
        self.output_layout = OutputLayout::with_tumor_index(tumor_index)
            .map_err(|e| DetectError::Config(e.to_string()))?;
        Ok(self)
    }

    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }
}

pub mod config;
pub mod diagnosis;
pub mod image;
pub mod models;
pub mod utils;
pub mod web;

// 重新导出主要类型
pub use config::Config;
pub use diagnosis::PredictionResponse;
pub use models::{Label, PredictionResult};
pub use utils::error::DetectError;

pub type Result<T> = std::result::Result<T, DetectError>;

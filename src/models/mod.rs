pub mod classifier;
pub mod manager;
pub mod onnx;

pub use classifier::{Classifier, InferenceBackend, Label, OutputLayout, PredictionResult};
pub use manager::{ModelManager, ModelStats};
pub use onnx::OnnxBackend;

pub mod pipeline;
pub mod types;

pub use pipeline::DiagnosisPipeline;
pub use types::{resolve_patient_id, PredictionResponse};

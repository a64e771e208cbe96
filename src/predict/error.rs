use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("propagation error: {0}")]
    Propagation(String),
}

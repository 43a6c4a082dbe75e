use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrustError {
    #[error("Image loading error: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("Recognition model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Recognition inference failed: {0}")]
    Inference(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Image has no pixels")]
    EmptyImage,
}

pub type Result<T> = std::result::Result<T, TrustError>;

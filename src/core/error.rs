use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("scan log error: {0}")]
    Persistence(#[from] csv::Error),
}

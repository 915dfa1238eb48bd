use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to load model {}: {message}", path.display())]
    ModelLoad { path: PathBuf, message: String },

    #[error("Failed to decode image {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    #[error("Image {} is {width}x{height}, smaller than the {crop}x{crop} crop", path.display())]
    ImageTooSmall {
        path: PathBuf,
        width: u32,
        height: u32,
        crop: u32,
    },

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("{action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Refusing to copy {} onto itself", path.display())]
    SameFile { path: PathBuf },

    #[error("Destination {} already received a file named {file_name} in this run", dest.display())]
    Collision { dest: PathBuf, file_name: String },
}

impl AppError {
    pub fn io(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        AppError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    /// True for errors the skip policy may downgrade to a warning.
    pub fn is_decode(&self) -> bool {
        matches!(self, AppError::Decode { .. } | AppError::ImageTooSmall { .. })
    }
}

impl From<ort::Error> for AppError {
    fn from(err: ort::Error) -> Self {
        AppError::Inference(err.to_string())
    }
}

impl From<ndarray::ShapeError> for AppError {
    fn from(err: ndarray::ShapeError) -> Self {
        AppError::Inference(format!("Failed to create tensor: {}", err))
    }
}

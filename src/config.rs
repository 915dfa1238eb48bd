//! Run configuration
//!
//! Everything that used to be a module-level constant (device, normalization
//! constants, batch size, paths) lives here and is handed to each component
//! explicitly.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "cloud-filter.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub scan: ScanConfig,
    pub inference: InferenceConfig,
    pub preprocess: PreprocessConfig,
    pub policy: PolicyConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    pub source_dirs: Vec<PathBuf>,
    pub destination: PathBuf,
    pub model: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Substring a file name must contain to be considered a tile.
    pub marker: String,
    pub extension: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub batch_size: usize,
    pub device: Device,
    pub num_threads: usize,
}

/// Must match the values the classifier was trained with. A mismatch does not
/// raise anything, it only makes predictions worse.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub crop_size: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub on_decode_error: DecodePolicy,
    pub on_collision: CollisionPolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Cpu,
    Gpu,
}

/// What to do with a file that cannot be decoded or is smaller than the crop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DecodePolicy {
    /// Abort the whole run.
    #[default]
    Fail,
    /// Log a warning, leave the file out of its batch and keep going.
    Skip,
}

/// What to do when two clear files from different sources share a base name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Later copies replace earlier ones (logged as a warning).
    #[default]
    Overwrite,
    Fail,
    /// Append `_1`, `_2`, ... to the file stem until the name is free.
    Rename,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_dirs: vec![PathBuf::from("data/tulips/bloom/16")],
            destination: PathBuf::from("data/tulips/bloom/filtered"),
            model: PathBuf::from("checkpoints/resnet101_v2.onnx"),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            marker: "wms".to_string(),
            extension: ".png".to_string(),
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            batch_size: 64,
            device: Device::Cpu,
            num_threads: 4,
        }
    }
}

// ImageNet normalization constants
impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            crop_size: 224,
            mean: [0.485, 0.456, 0.406],
            std: [0.229, 0.224, 0.225],
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Cannot parse {}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// An explicitly requested file must exist. Without one, the default file is
    /// used when present and built-in defaults otherwise.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, AppError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.is_file() {
                    Self::load(default_path)
                } else {
                    tracing::info!("No {} found, using built-in defaults", DEFAULT_CONFIG_PATH);
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.inference.batch_size == 0 {
            return Err(AppError::Config("batch_size must be at least 1".to_string()));
        }
        if self.inference.num_threads == 0 {
            return Err(AppError::Config("num_threads must be at least 1".to_string()));
        }
        if self.paths.source_dirs.is_empty() {
            return Err(AppError::Config("no source directories configured".to_string()));
        }
        if self.scan.extension.is_empty() {
            return Err(AppError::Config("scan.extension must not be empty".to_string()));
        }
        self.preprocess.validate()
    }
}

impl PreprocessConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.crop_size == 0 {
            return Err(AppError::Config("crop_size must be positive".to_string()));
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err(AppError::Config(format!("mean must be finite, got {:?}", self.mean)));
        }
        if self.std.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(AppError::Config(format!(
                "std must be finite and positive, got {:?}",
                self.std
            )));
        }
        Ok(())
    }
}

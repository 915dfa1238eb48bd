//! Batch assembly
//!
//! Splits a scan result into contiguous groups and stacks each group's
//! preprocessed tensors into one `[n, 3, crop, crop]` input.

use crate::config::{DecodePolicy, PreprocessConfig};
use crate::error::AppError;
use crate::models::classify_types::SkippedFile;
use crate::services::classifier::inference::preprocess_image;
use ndarray::{s, Array4};
use std::path::PathBuf;

/// Paths and tensor rows are built together, so row `i` always belongs to `paths[i]`.
#[derive(Debug)]
pub struct Batch {
    pub paths: Vec<PathBuf>,
    pub tensor: Array4<f32>,
}

/// Contiguous, order-preserving groups of at most `batch_size` paths.
/// Only the last group may be shorter.
pub fn partition(paths: &[PathBuf], batch_size: usize) -> Result<Vec<&[PathBuf]>, AppError> {
    if batch_size == 0 {
        return Err(AppError::Config("batch_size must be at least 1".to_string()));
    }
    Ok(paths.chunks(batch_size).collect())
}

/// Preprocesses every path of one group. Under [`DecodePolicy::Skip`] files that
/// fail to decode are left out of the batch and returned separately.
pub fn load_batch(
    paths: &[PathBuf],
    cfg: &PreprocessConfig,
    policy: DecodePolicy,
) -> Result<(Batch, Vec<SkippedFile>), AppError> {
    let mut kept = Vec::with_capacity(paths.len());
    let mut tensors = Vec::with_capacity(paths.len());
    let mut skipped = Vec::new();

    for path in paths {
        match preprocess_image(path, cfg) {
            Ok(tensor) => {
                kept.push(path.clone());
                tensors.push(tensor);
            }
            Err(e) if policy == DecodePolicy::Skip && e.is_decode() => {
                tracing::warn!("Skipping {}", e);
                skipped.push(SkippedFile {
                    path: path.clone(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    let crop = cfg.crop_size as usize;
    let mut tensor = Array4::<f32>::zeros((tensors.len(), 3, crop, crop));
    for (idx, image) in tensors.iter().enumerate() {
        tensor.slice_mut(s![idx, .., .., ..]).assign(image);
    }

    Ok((Batch { paths: kept, tensor }, skipped))
}

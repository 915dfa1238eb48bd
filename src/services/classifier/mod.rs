pub mod batch;
pub mod inference;
pub mod model_manager;

use crate::error::AppError;
use crate::models::classify_types::ImageClass;
use batch::Batch;
use ndarray::{Array2, Array4};
use std::path::PathBuf;

/// A two-class image classifier: `[batch, 3, H, W]` in, `[batch, 2]` scores out.
///
/// Scores may be logits or probabilities; only their argmax is used.
pub trait Classifier {
    fn scores(&mut self, batch: Array4<f32>) -> Result<Array2<f32>, AppError>;
}

/// Runs one batch and pairs every path with its predicted class, in batch order.
pub fn classify_batch<C: Classifier + ?Sized>(
    classifier: &mut C,
    batch: Batch,
) -> Result<Vec<(PathBuf, ImageClass)>, AppError> {
    let Batch { paths, tensor } = batch;
    if paths.is_empty() {
        return Ok(Vec::new());
    }

    let scores = classifier.scores(tensor)?;
    if scores.nrows() != paths.len() {
        return Err(AppError::Inference(format!(
            "batch of {} images produced {} score rows",
            paths.len(),
            scores.nrows()
        )));
    }

    let classes = inference::predict_classes(&scores)?;
    Ok(paths.into_iter().zip(classes).collect())
}

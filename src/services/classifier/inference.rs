use crate::config::PreprocessConfig;
use crate::error::AppError;
use crate::models::classify_types::ImageClass;
use image::{DynamicImage, GenericImageView, ImageReader, RgbImage};
use ndarray::{Array2, Array3};
use std::path::Path;

pub fn load_image(path: &Path) -> Result<DynamicImage, AppError> {
    ImageReader::open(path)
        .map_err(|e| AppError::Decode {
            path: path.to_path_buf(),
            message: format!("cannot open: {}", e),
        })?
        .decode()
        .map_err(|e| AppError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Cuts a `crop_size` square out of the middle of the image. Images smaller
/// than the crop in either dimension are rejected rather than padded.
pub fn center_crop(img: &DynamicImage, crop_size: u32, path: &Path) -> Result<RgbImage, AppError> {
    let (w, h) = img.dimensions();
    if w < crop_size || h < crop_size {
        return Err(AppError::ImageTooSmall {
            path: path.to_path_buf(),
            width: w,
            height: h,
            crop: crop_size,
        });
    }

    let crop_x = (w - crop_size) / 2;
    let crop_y = (h - crop_size) / 2;
    Ok(img.crop_imm(crop_x, crop_y, crop_size, crop_size).to_rgb8())
}

/// HWC u8 pixels -> CHW f32, scaled to [0, 1] then normalized per channel.
pub fn to_normalized_chw(rgb: &RgbImage, cfg: &PreprocessConfig) -> Result<Array3<f32>, AppError> {
    let (w, h) = rgb.dimensions();
    let hw = (w * h) as usize;
    let mut data = vec![0f32; 3 * hw];

    // Planar writes: channel c of pixel i lands at c * hw + i.
    for (i, pixel) in rgb.as_raw().chunks_exact(3).enumerate() {
        for c in 0..3 {
            data[c * hw + i] = (pixel[c] as f32 / 255.0 - cfg.mean[c]) / cfg.std[c];
        }
    }

    Ok(Array3::from_shape_vec((3, h as usize, w as usize), data)?)
}

/// Decode, crop and normalize one file into a `3 x crop x crop` tensor.
pub fn preprocess_image(path: &Path, cfg: &PreprocessConfig) -> Result<Array3<f32>, AppError> {
    let img = load_image(path)?;
    let cropped = center_crop(&img, cfg.crop_size, path)?;
    to_normalized_chw(&cropped, cfg)
}

/// Index of the highest score. Ties and NaNs resolve to the lowest index.
pub fn argmax(scores: &[f32]) -> usize {
    let mut best = 0;
    for (idx, &score) in scores.iter().enumerate().skip(1) {
        if score > scores[best] {
            best = idx;
        }
    }
    best
}

/// Row-wise argmax over a `[batch, 2]` score matrix.
pub fn predict_classes(scores: &Array2<f32>) -> Result<Vec<ImageClass>, AppError> {
    if scores.ncols() != ImageClass::COUNT {
        return Err(AppError::Inference(format!(
            "expected {} scores per image, got {}",
            ImageClass::COUNT,
            scores.ncols()
        )));
    }

    scores
        .rows()
        .into_iter()
        .map(|row| {
            let row: Vec<f32> = row.iter().copied().collect();
            let idx = argmax(&row);
            ImageClass::from_index(idx)
                .ok_or_else(|| AppError::Inference(format!("class index {} out of range", idx)))
        })
        .collect()
}

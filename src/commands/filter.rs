use crate::config::Config;
use crate::error::AppError;
use crate::models::classify_types::FilterReport;
use crate::services::classifier::model_manager::OnnxClassifier;
use crate::services::classifier::Classifier;
use crate::services::filter_service::{collect_clear, FilterSettings};
use crate::services::fs_service::{self, PatternSelector};
use std::path::Path;

/// Loads the checkpoint named in the config, then filters. The model is loaded
/// before any directory is touched so a bad checkpoint fails the run up front.
pub fn filter_with_model(config: &Config) -> Result<FilterReport, AppError> {
    config.validate()?;
    let mut classifier = OnnxClassifier::load(&config.paths.model, &config.inference)?;
    filter_images(config, &mut classifier)
}

/// Classifies every configured source directory and copies the clear tiles
/// into the destination directory. Expects a config that already passed
/// [`Config::validate`].
pub fn filter_images<C: Classifier + ?Sized>(
    config: &Config,
    classifier: &mut C,
) -> Result<FilterReport, AppError> {
    fs_service::check_destination(&config.paths.destination, &config.paths.source_dirs)?;

    let selector = PatternSelector::from(&config.scan);
    let settings = FilterSettings {
        selector: &selector,
        batch_size: config.inference.batch_size,
        preprocess: &config.preprocess,
        on_decode_error: config.policy.on_decode_error,
    };

    let mut report = collect_clear(&config.paths.source_dirs, classifier, &settings)?;

    let copied = fs_service::copy_files(
        &report.clear,
        &config.paths.destination,
        config.policy.on_collision,
    )?;
    report.copied = copied.into_iter().map(|c| c.destination).collect();

    tracing::info!(
        "Copied {} of {} images to {}",
        report.copied.len(),
        report.total_found(),
        config.paths.destination.display()
    );
    if !report.skipped.is_empty() {
        tracing::warn!("{} images could not be decoded and were skipped", report.skipped.len());
    }

    Ok(report)
}

pub fn write_report(report: &FilterReport, path: &Path) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| AppError::io("Failed to serialize report", path, e.into()))?;
    std::fs::write(path, json).map_err(|e| AppError::io("Failed to write report", path, e))
}

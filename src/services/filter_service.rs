use crate::config::{DecodePolicy, PreprocessConfig};
use crate::error::AppError;
use crate::models::classify_types::{DirectoryReport, FilterReport, ImageClass, SkippedFile};
use crate::services::classifier::batch::{load_batch, partition};
use crate::services::classifier::{classify_batch, Classifier};
use crate::services::fs_service::{scan_directory, FileSelector};
use std::path::{Path, PathBuf};

/// Everything the orchestrator needs besides the model itself.
pub struct FilterSettings<'a> {
    pub selector: &'a dyn FileSelector,
    pub batch_size: usize,
    pub preprocess: &'a PreprocessConfig,
    pub on_decode_error: DecodePolicy,
}

#[derive(Debug, Default)]
pub struct DirectoryOutcome {
    pub report: DirectoryReport,
    pub clear: Vec<PathBuf>,
    pub skipped: Vec<SkippedFile>,
}

/// Scans one directory and returns the files the classifier considers clear,
/// in scan order.
pub fn find_clear<C: Classifier + ?Sized>(
    root: &Path,
    classifier: &mut C,
    settings: &FilterSettings<'_>,
) -> Result<DirectoryOutcome, AppError> {
    tracing::info!("Scanning dir {}", root.display());
    let files = scan_directory(root, settings.selector)?;
    tracing::info!("Found {} images", files.len());

    let mut outcome = DirectoryOutcome {
        report: DirectoryReport {
            directory: root.to_path_buf(),
            found: files.len(),
            ..Default::default()
        },
        ..Default::default()
    };

    let groups = partition(&files, settings.batch_size)?;
    let total = groups.len();
    for (n, group) in groups.into_iter().enumerate() {
        let (batch, skipped) = load_batch(group, settings.preprocess, settings.on_decode_error)?;
        outcome.skipped.extend(skipped);

        let predictions = classify_batch(classifier, batch)?;
        outcome.clear.extend(
            predictions
                .into_iter()
                .filter(|(_, class)| *class == ImageClass::Clear)
                .map(|(path, _)| path),
        );
        tracing::debug!("Batch {}/{} done, {} clear so far", n + 1, total, outcome.clear.len());
    }

    outcome.report.clear = outcome.clear.len();
    outcome.report.skipped = outcome.skipped.len();
    tracing::info!("Found {} clear images", outcome.clear.len());

    Ok(outcome)
}

/// Runs [`find_clear`] over every source directory in order and accumulates
/// one clear list. The first failure aborts the run.
pub fn collect_clear<C: Classifier + ?Sized>(
    roots: &[PathBuf],
    classifier: &mut C,
    settings: &FilterSettings<'_>,
) -> Result<FilterReport, AppError> {
    let mut report = FilterReport::default();
    for root in roots {
        let outcome = find_clear(root, classifier, settings)?;
        report.directories.push(outcome.report);
        report.clear.extend(outcome.clear);
        report.skipped.extend(outcome.skipped);
    }
    Ok(report)
}

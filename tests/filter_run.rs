use cloud_filter_lib::commands::filter::{filter_images, filter_with_model, write_report};
use cloud_filter_lib::config::{CollisionPolicy, Config, DecodePolicy};
use cloud_filter_lib::error::AppError;
use cloud_filter_lib::services::classifier::Classifier;
use image::{Rgb, RgbImage};
use ndarray::{Array2, Array4, Axis};
use std::path::{Path, PathBuf};

/// Predicts class 0 for every image.
struct AlwaysClear {
    calls: usize,
}

impl Classifier for AlwaysClear {
    fn scores(&mut self, batch: Array4<f32>) -> Result<Array2<f32>, AppError> {
        self.calls += 1;
        let n = batch.len_of(Axis(0));
        let mut out = Array2::zeros((n, 2));
        out.column_mut(0).fill(1.0);
        Ok(out)
    }
}

fn write_tiles(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
    std::fs::create_dir_all(dir).unwrap();
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let path = dir.join(name);
            RgbImage::from_pixel(256, 230, Rgb([i as u8 * 20, 90, 160]))
                .save(&path)
                .unwrap();
            path
        })
        .collect()
}

fn config_for(sources: Vec<PathBuf>, destination: PathBuf, batch_size: usize) -> Config {
    let mut config = Config::default();
    config.paths.source_dirs = sources;
    config.paths.destination = destination;
    config.inference.batch_size = batch_size;
    config
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn five_clear_tiles_in_batches_of_two_are_all_copied() {
    let root = tempfile::tempdir().unwrap();
    let source = root.path().join("bloom").join("16");
    let names = ["t1_wms.png", "t2_wms.png", "t3_wms.png", "t4_wms.png", "t5_wms.png"];
    let tiles = write_tiles(&source, &names);
    std::fs::write(source.join("notes.txt"), b"not a tile").unwrap();
    let dest = root.path().join("bloom").join("filtered");

    let mut stub = AlwaysClear { calls: 0 };
    let report = filter_images(&config_for(vec![source.clone()], dest.clone(), 2), &mut stub).unwrap();

    assert_eq!(stub.calls, 3);
    assert_eq!(report.directories[0].found, 5);
    assert_eq!(report.directories[0].clear, 5);
    assert_eq!(report.copied.len(), 5);
    assert_eq!(file_names(&dest), names.iter().map(|n| n.to_string()).collect::<Vec<_>>());

    let mut clear = report.clear.clone();
    clear.sort();
    assert_eq!(clear, tiles);

    for tile in &tiles {
        let copy = dest.join(tile.file_name().unwrap());
        assert_eq!(std::fs::read(tile).unwrap(), std::fs::read(copy).unwrap());
    }
}

#[test]
fn empty_source_directory_copies_nothing() {
    let root = tempfile::tempdir().unwrap();
    let source = root.path().join("empty");
    std::fs::create_dir_all(&source).unwrap();
    let dest = root.path().join("filtered");

    let mut stub = AlwaysClear { calls: 0 };
    let report = filter_images(&config_for(vec![source], dest.clone(), 4), &mut stub).unwrap();

    assert_eq!(stub.calls, 0);
    assert_eq!(report.total_found(), 0);
    assert!(report.copied.is_empty());
    assert!(dest.is_dir());
    assert!(file_names(&dest).is_empty());
}

#[test]
fn existing_destination_from_an_earlier_run_is_reused() {
    let root = tempfile::tempdir().unwrap();
    let source = root.path().join("16");
    write_tiles(&source, &["a_wms.png", "b_wms.png"]);
    let dest = root.path().join("filtered");

    let config = config_for(vec![source], dest.clone(), 64);
    filter_images(&config, &mut AlwaysClear { calls: 0 }).unwrap();
    let second = filter_images(&config, &mut AlwaysClear { calls: 0 }).unwrap();

    assert_eq!(second.copied.len(), 2);
    assert_eq!(file_names(&dest), vec!["a_wms.png", "b_wms.png"]);
}

#[test]
fn several_directories_with_clashing_names_follow_the_collision_policy() {
    let root = tempfile::tempdir().unwrap();
    let d16 = root.path().join("16");
    let d17 = root.path().join("17");
    write_tiles(&d16, &["tile_wms.png"]);
    write_tiles(&d17, &["tile_wms.png", "other_wms.png"]);
    let dest = root.path().join("filtered");

    let mut config = config_for(vec![d16, d17], dest.clone(), 8);
    config.policy.on_collision = CollisionPolicy::Fail;
    let err = filter_images(&config, &mut AlwaysClear { calls: 0 }).unwrap_err();
    assert!(matches!(err, AppError::Collision { .. }));

    config.policy.on_collision = CollisionPolicy::Rename;
    let report = filter_images(&config, &mut AlwaysClear { calls: 0 }).unwrap();
    assert_eq!(report.directories.len(), 2);
    assert_eq!(report.copied.len(), 3);
    assert!(dest.join("tile_wms_1.png").is_file());
}

#[test]
fn undersized_tile_aborts_or_is_skipped() {
    let root = tempfile::tempdir().unwrap();
    let source = root.path().join("16");
    write_tiles(&source, &["big_wms.png"]);
    RgbImage::new(64, 64).save(source.join("small_wms.png")).unwrap();
    let dest = root.path().join("filtered");

    let mut config = config_for(vec![source], dest.clone(), 8);
    let err = filter_images(&config, &mut AlwaysClear { calls: 0 }).unwrap_err();
    assert!(matches!(err, AppError::ImageTooSmall { .. }));
    assert!(!dest.exists());

    config.policy.on_decode_error = DecodePolicy::Skip;
    let report = filter_images(&config, &mut AlwaysClear { calls: 0 }).unwrap();
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(file_names(&dest), vec!["big_wms.png"]);
}

#[test]
fn missing_checkpoint_fails_before_scanning() {
    let root = tempfile::tempdir().unwrap();
    let mut config = config_for(
        vec![root.path().join("does-not-exist")],
        root.path().join("filtered"),
        8,
    );
    config.paths.model = root.path().join("checkpoints").join("resnet101_v2.onnx");

    let err = filter_with_model(&config).unwrap_err();
    assert!(matches!(err, AppError::ModelLoad { .. }));
    assert!(!root.path().join("filtered").exists());
}

#[test]
fn report_is_written_as_json() {
    let root = tempfile::tempdir().unwrap();
    let source = root.path().join("16");
    write_tiles(&source, &["a_wms.png"]);
    let config = config_for(vec![source], root.path().join("filtered"), 8);
    let report = filter_images(&config, &mut AlwaysClear { calls: 0 }).unwrap();

    let path = root.path().join("report.json");
    write_report(&report, &path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["directories"][0]["found"], 1);
    assert_eq!(json["copied"].as_array().unwrap().len(), 1);
}

#[test]
fn destination_inside_the_source_list_is_refused_and_tiles_survive() {
    let root = tempfile::tempdir().unwrap();
    let source = root.path().join("16");
    let tiles = write_tiles(&source, &["a_wms.png", "b_wms.png"]);
    let before: Vec<Vec<u8>> = tiles.iter().map(|t| std::fs::read(t).unwrap()).collect();

    let config = config_for(vec![source.clone()], source.clone(), 8);
    let err = filter_images(&config, &mut AlwaysClear { calls: 0 }).unwrap_err();
    assert!(matches!(err, AppError::Config(_)));

    let after: Vec<Vec<u8>> = tiles.iter().map(|t| std::fs::read(t).unwrap()).collect();
    assert_eq!(before, after);
}

#[test]
fn missing_source_directory_contributes_nothing() {
    let root = tempfile::tempdir().unwrap();
    let present = root.path().join("16");
    let absent = root.path().join("17");
    write_tiles(&present, &["a_wms.png", "b_wms.png"]);
    let dest = root.path().join("filtered");

    let report = filter_images(
        &config_for(vec![present, absent.clone()], dest.clone(), 8),
        &mut AlwaysClear { calls: 0 },
    )
    .unwrap();

    assert_eq!(report.directories.len(), 2);
    assert_eq!(report.directories[1].directory, absent);
    assert_eq!(report.directories[1].found, 0);
    assert_eq!(report.copied.len(), 2);
    assert_eq!(file_names(&dest), vec!["a_wms.png", "b_wms.png"]);
}

#[test]
fn invalid_config_is_reported_before_the_model_is_loaded() {
    let root = tempfile::tempdir().unwrap();
    let mut config = config_for(vec![root.path().join("16")], root.path().join("filtered"), 0);
    config.paths.model = root.path().join("missing.onnx");

    let err = filter_with_model(&config).unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
}

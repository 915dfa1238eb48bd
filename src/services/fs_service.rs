use crate::config::{CollisionPolicy, ScanConfig};
use crate::error::AppError;
use crate::models::fs_types::CopiedFile;
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Decides whether a file from a directory listing is a candidate tile.
pub trait FileSelector {
    fn selects(&self, path: &Path) -> bool;
}

impl<F: Fn(&Path) -> bool> FileSelector for F {
    fn selects(&self, path: &Path) -> bool {
        self(path)
    }
}

/// Shell-glob style `*<marker>*<extension>` match on the file name.
#[derive(Debug, Clone)]
pub struct PatternSelector {
    pub marker: String,
    pub extension: String,
}

impl PatternSelector {
    pub fn new(marker: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            extension: extension.into(),
        }
    }
}

impl From<&ScanConfig> for PatternSelector {
    fn from(scan: &ScanConfig) -> Self {
        Self::new(scan.marker.clone(), scan.extension.clone())
    }
}

impl FileSelector for PatternSelector {
    fn selects(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        // Wildcards never match a leading dot.
        if name.starts_with('.') {
            return false;
        }
        name.strip_suffix(self.extension.as_str())
            .map(|stem| stem.contains(self.marker.as_str()))
            .unwrap_or(false)
    }
}

/// Non-recursive listing of the regular files in `root` accepted by `selector`,
/// in the order the filesystem returns them. A directory that does not exist
/// yields no files; any other read failure is an error.
pub fn scan_directory(root: &Path, selector: &dyn FileSelector) -> Result<Vec<PathBuf>, AppError> {
    let read_dir = match std::fs::read_dir(root) {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("Source directory {} does not exist", root.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(AppError::io("Cannot read directory", root, e)),
    };

    let mut images = Vec::new();
    for entry in read_dir {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        if selector.selects(&path) {
            images.push(path);
        }
    }

    Ok(images)
}

/// Creates `dest` and its parents. An existing directory is fine, an existing
/// file at that path is not.
pub fn ensure_dir(dest: &Path) -> Result<(), AppError> {
    match std::fs::create_dir_all(dest) {
        Ok(()) => Ok(()),
        Err(_) if dest.is_dir() => Ok(()),
        Err(e) => Err(AppError::io("Failed to create directory", dest, e)),
    }
}

/// True when both paths exist and resolve to the same file.
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Fails when `dest` is one of `sources`, since copying a tile onto itself
/// truncates it.
pub fn check_destination(dest: &Path, sources: &[PathBuf]) -> Result<(), AppError> {
    match sources.iter().find(|src| same_file(src, dest)) {
        Some(src) => Err(AppError::Config(format!(
            "destination {} is also the source directory {}",
            dest.display(),
            src.display()
        ))),
        None => Ok(()),
    }
}

/// `name_<n>.ext`, or `name_<n>` for files without an extension.
fn numbered_name(file_name: &OsStr, n: usize) -> OsString {
    let as_path = Path::new(file_name);
    let mut renamed = as_path.file_stem().unwrap_or(file_name).to_os_string();
    renamed.push(format!("_{}", n));
    if let Some(ext) = as_path.extension() {
        renamed.push(".");
        renamed.push(ext);
    }
    renamed
}

/// Copies every path into `dest` under its base name. Collisions are counted
/// against names already written by this call; files left over from earlier
/// runs are overwritten.
pub fn copy_files(
    paths: &[PathBuf],
    dest: &Path,
    policy: CollisionPolicy,
) -> Result<Vec<CopiedFile>, AppError> {
    ensure_dir(dest)?;

    let mut used: HashSet<OsString> = HashSet::new();
    let mut copied = Vec::with_capacity(paths.len());

    for src in paths {
        let file_name = src.file_name().ok_or_else(|| {
            AppError::io(
                "Invalid file path",
                src,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "no file name"),
            )
        })?;

        let target_name = if used.contains(file_name) {
            match policy {
                CollisionPolicy::Overwrite => {
                    tracing::warn!(
                        "{} overwrites an earlier copy with the same name",
                        src.display()
                    );
                    file_name.to_os_string()
                }
                CollisionPolicy::Fail => {
                    return Err(AppError::Collision {
                        dest: dest.to_path_buf(),
                        file_name: file_name.to_string_lossy().to_string(),
                    });
                }
                CollisionPolicy::Rename => {
                    let mut n = 1;
                    while used.contains(&numbered_name(file_name, n)) {
                        n += 1;
                    }
                    let renamed = numbered_name(file_name, n);
                    tracing::warn!(
                        "{} collides with an earlier copy, writing it as {}",
                        src.display(),
                        renamed.to_string_lossy()
                    );
                    renamed
                }
            }
        } else {
            file_name.to_os_string()
        };

        let new_path = dest.join(&target_name);
        if same_file(src, &new_path) {
            return Err(AppError::SameFile { path: src.clone() });
        }
        std::fs::copy(src, &new_path).map_err(|e| AppError::io("Failed to copy", src, e))?;
        used.insert(target_name);
        copied.push(CopiedFile {
            source: src.clone(),
            destination: new_path,
        });
    }

    Ok(copied)
}

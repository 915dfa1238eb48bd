use serde::Serialize;
use std::path::PathBuf;

/// Class indices as fixed by the trained model's output layer.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageClass {
    Clear = 0,
    Cloudy = 1,
}

impl ImageClass {
    pub const COUNT: usize = 2;

    pub fn from_index(idx: usize) -> Option<Self> {
        match idx {
            0 => Some(ImageClass::Clear),
            1 => Some(ImageClass::Cloudy),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Serialize, Clone, Default)]
pub struct DirectoryReport {
    pub directory: PathBuf,
    pub found: usize,
    pub clear: usize,
    pub skipped: usize,
}

/// Summary of one filtering run, written as JSON when `--report` is given.
#[derive(Debug, Serialize, Clone, Default)]
pub struct FilterReport {
    pub directories: Vec<DirectoryReport>,
    pub clear: Vec<PathBuf>,
    pub copied: Vec<PathBuf>,
    pub skipped: Vec<SkippedFile>,
}

impl FilterReport {
    pub fn total_found(&self) -> usize {
        self.directories.iter().map(|d| d.found).sum()
    }
}

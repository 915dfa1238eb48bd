use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct CopiedFile {
    pub source: PathBuf,
    pub destination: PathBuf,
}

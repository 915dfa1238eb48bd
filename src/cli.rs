use crate::config::{CollisionPolicy, Config, DecodePolicy, Device};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Copy the cloud-free tiles of a download directory")]
pub struct Args {
    /// TOML config file (defaults to ./cloud-filter.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Source directory to scan; repeat for several. Replaces the configured list.
    #[arg(short, long = "source")]
    pub sources: Vec<PathBuf>,

    /// Directory the clear tiles are copied into
    #[arg(short, long)]
    pub destination: Option<PathBuf>,

    /// ONNX checkpoint of the clear/cloudy classifier
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    #[arg(short, long)]
    pub batch_size: Option<usize>,

    #[arg(long, value_enum)]
    pub device: Option<Device>,

    #[arg(long, value_enum)]
    pub on_decode_error: Option<DecodePolicy>,

    #[arg(long, value_enum)]
    pub on_collision: Option<CollisionPolicy>,

    /// Write a JSON summary of the run to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl Args {
    pub fn apply(&self, config: &mut Config) {
        if !self.sources.is_empty() {
            config.paths.source_dirs = self.sources.clone();
        }
        if let Some(dest) = &self.destination {
            config.paths.destination = dest.clone();
        }
        if let Some(model) = &self.model {
            config.paths.model = model.clone();
        }
        if let Some(batch_size) = self.batch_size {
            config.inference.batch_size = batch_size;
        }
        if let Some(device) = self.device {
            config.inference.device = device;
        }
        if let Some(policy) = self.on_decode_error {
            config.policy.on_decode_error = policy;
        }
        if let Some(policy) = self.on_collision {
            config.policy.on_collision = policy;
        }
    }
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::model::AxisMap;

#[derive(Debug, Parser)]
#[command(
    name = "volume-annotator",
    version,
    about = "Depth-range annotation engine for volumetric scans"
)]
pub(super) struct Cli {
    #[command(subcommand)]
    pub(super) command: Commands,
}

#[derive(Debug, Subcommand)]
pub(super) enum Commands {
    /// Prints the geometry of a scan and the labels stored next to it.
    Info {
        input: PathBuf,
        #[arg(long)]
        doctor: Option<String>,
    },
    /// Renders the three views at one depth, one PNG per axis.
    Render {
        input: PathBuf,
        #[arg(long)]
        out_dir: PathBuf,
        #[arg(long)]
        depth: Option<i64>,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        width: Option<f32>,
        #[arg(long)]
        height: Option<f32>,
    },
    /// Reports how much of the depth range a label file covers.
    Coverage {
        labels: PathBuf,
        #[arg(long)]
        depth: usize,
    },
    /// Lists readable scans below a directory.
    Scan {
        dir: PathBuf,
        #[arg(long)]
        doctor: Option<String>,
    },
    /// Writes a synthetic TIFF stack with a bright tube running through depth.
    Phantom {
        output: PathBuf,
        #[arg(long, default_value_t = 64)]
        width: usize,
        #[arg(long, default_value_t = 64)]
        height: usize,
        #[arg(long, default_value_t = 48)]
        depth: usize,
    },
}

#[derive(Debug, Serialize)]
pub(super) struct VolumeInfo {
    pub(super) shape: AxisMap<usize>,
    pub(super) spacing: AxisMap<f32>,
    pub(super) physical_size: AxisMap<f32>,
    pub(super) center: AxisMap<usize>,
    pub(super) intensity_range: (f32, f32),
    pub(super) source: Option<String>,
    pub(super) label_file: Option<String>,
    pub(super) annotations: usize,
    pub(super) coverage_percent: u32,
}

#[derive(Debug, Serialize)]
pub(super) struct RenderReport {
    pub(super) depth: usize,
    pub(super) zoom: f32,
    pub(super) coverage_percent: u32,
    pub(super) outputs: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
pub(super) struct CoverageReport {
    pub(super) annotations: usize,
    pub(super) depth: usize,
    pub(super) fraction: f32,
    pub(super) percent: u32,
}

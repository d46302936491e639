use std::fs;

use clap::Parser;
use eframe::egui;
use ndarray::Array3;
use serde_json::json;

use crate::config::{ViewerConfig, load_config};
use crate::formats::{IoError, save_canvas_png, write_volume};
use crate::model::{Axis, AxisMap, ScanVolume};
use crate::runtime::{AnnotatorSession, Result};
use crate::source::{
    MemoryVolumeSource, SourceError, VolumeSource, read_labels, scan_directory,
};
use crate::viewer::coverage_fraction;

use super::types::{Cli, Commands, CoverageReport, RenderReport, VolumeInfo};

pub fn run_cli() -> std::result::Result<(), String> {
    let cli = Cli::parse();
    execute(cli.command).map_err(|error| error.to_string())
}

fn execute(command: Commands) -> Result<()> {
    match command {
        Commands::Info { input, doctor } => {
            let mut source = MemoryVolumeSource::new(doctor);
            let loaded = source.load_file(&input)?;
            let volume = source
                .volume()
                .ok_or(SourceError::NoVolumeLoaded)?;
            let info = VolumeInfo {
                shape: loaded.extent.shape,
                spacing: loaded.extent.spacing,
                physical_size: loaded.extent.physical_size(),
                center: loaded.extent.center,
                intensity_range: volume.intensity_range,
                source: volume.source.as_ref().map(|path| path.display().to_string()),
                label_file: source
                    .label_file()
                    .filter(|path| path.exists())
                    .map(|path| path.display().to_string()),
                annotations: loaded.annotations.len(),
                coverage_percent: percent(coverage_fraction(
                    &loaded.annotations,
                    loaded.extent.depth_count(),
                )),
            };
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Commands::Render {
            input,
            out_dir,
            depth,
            config,
            width,
            height,
        } => {
            let config = match config {
                Some(path) => load_config(path)?,
                None => ViewerConfig::default(),
            };
            let source = MemoryVolumeSource::new(config.doctor_name.clone());
            let default_container = config.container_size();
            let mut session = AnnotatorSession::new(config, source);
            session.open(&input)?;

            let container = egui::vec2(
                width.unwrap_or(default_container.x),
                height.unwrap_or(default_container.y),
            );
            session.apply(|state| {
                Axis::ALL
                    .into_iter()
                    .flat_map(|axis| state.set_container(axis, container))
                    .collect()
            });
            if let Some(depth) = depth {
                session.apply(|state| state.set_depth(depth));
            }

            fs::create_dir_all(&out_dir).map_err(IoError::from)?;
            let mut outputs = Vec::new();
            for frame in session.state().redraw_all() {
                let path = out_dir.join(format!("{}.png", frame.axis));
                save_canvas_png(&frame.canvas, &path)?;
                outputs.push(path);
            }
            let state = session.state();
            let report = RenderReport {
                depth: state.current_z(),
                zoom: state.zoom().value(),
                coverage_percent: state.coverage_percent(),
                outputs,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Coverage { labels, depth } => {
            let stored = read_labels(&labels)?;
            let fraction = coverage_fraction(&stored.annotations, depth);
            let report = CoverageReport {
                annotations: stored.annotations.len(),
                depth,
                fraction,
                percent: percent(fraction),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Scan { dir, doctor } => {
            let entries = scan_directory(&dir, doctor.as_deref());
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        Commands::Phantom {
            output,
            width,
            height,
            depth,
        } => {
            let volume = phantom_volume(width, height, depth)?;
            write_volume(&output, &volume)?;
            println!("{}", json!({"status": "ok", "output": output}));
        }
    }

    Ok(())
}

fn percent(fraction: f32) -> u32 {
    (fraction * 100.0).round() as u32
}

/// Dim background with a bright tube whose center drifts across x with depth.
fn phantom_volume(width: usize, height: usize, depth: usize) -> Result<ScanVolume> {
    let radius = (width.min(height) as f32 / 8.0).max(1.0);
    let data = Array3::from_shape_fn((depth, height, width), |(z, y, x)| {
        let progress = z as f32 / depth.max(1) as f32;
        let center_x = width as f32 * (0.3 + 0.4 * progress);
        let center_y = height as f32 / 2.0;
        let distance = ((x as f32 - center_x).powi(2) + (y as f32 - center_y).powi(2)).sqrt();
        if distance <= radius { 200 } else { 30 }
    });
    let volume = ScanVolume::new(data, AxisMap::new(0.5, 0.5, 1.0)).map_err(IoError::from)?;
    Ok(volume)
}

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use plotters::prelude::*;
use tracing::{error, info};

use crate::models::chart::PIE_TITLE;
use crate::models::usage::{ChartSlice, TableRow};

const PIE_DIMENSIONS: (u32, u32) = (800, 600);

const PALETTE: &[RGBColor] = &[
    RGBColor(66, 133, 244),
    RGBColor(219, 68, 55),
    RGBColor(244, 180, 0),
    RGBColor(15, 157, 88),
    RGBColor(171, 71, 188),
    RGBColor(0, 172, 193),
    RGBColor(255, 112, 67),
    RGBColor(158, 157, 36),
];

/// Render the pie chart to a timestamped PNG in `dir`.
/// Export is best-effort: any failure is logged and reported as `None`,
/// never bubbled up to the request.
pub fn export_chart_png(slices: &[ChartSlice], dir: &Path) -> Option<PathBuf> {
    let path = dir.join(format!(
        "disk_usage_pie_{}.png",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ));
    match render_pie(slices, &path) {
        Ok(()) => {
            info!(path = %path.display(), "exported pie chart");
            Some(path)
        }
        Err(e) => {
            error!(error = %e, "pie chart export failed");
            None
        }
    }
}

fn render_pie(slices: &[ChartSlice], path: &Path) -> Result<()> {
    if slices.is_empty() {
        anyhow::bail!("no slices above chart threshold");
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let sizes: Vec<f64> = slices.iter().map(|s| s.usage_percent).collect();
    let labels: Vec<String> = slices.iter().map(|s| s.filesystem.clone()).collect();
    let colors: Vec<RGBColor> = (0..slices.len())
        .map(|i| PALETTE[i % PALETTE.len()])
        .collect();

    let root = BitMapBackend::new(path, PIE_DIMENSIONS).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow::anyhow!("{e}"))?;
    let root = root
        .titled(PIE_TITLE, ("sans-serif", 24))
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let center = (
        PIE_DIMENSIONS.0 as i32 / 2,
        PIE_DIMENSIONS.1 as i32 / 2,
    );
    let radius = (PIE_DIMENSIONS.1 as f64) * 0.35;
    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.label_style(("sans-serif", 16).into_font());
    root.draw(&pie).map_err(|e| anyhow::anyhow!("{e}"))?;
    root.present().map_err(|e| anyhow::anyhow!("{e}"))?;
    Ok(())
}

/// Write the presentation table to a timestamped CSV in `dir`.
/// Same best-effort contract as the chart export.
pub fn export_table_csv(rows: &[TableRow], dir: &Path) -> Option<PathBuf> {
    let path = dir.join(format!(
        "disk_usage_table_{}.csv",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ));
    match write_csv(rows, &path) {
        Ok(()) => {
            info!(path = %path.display(), "exported usage table");
            Some(path)
        }
        Err(e) => {
            error!(error = %e, "usage table export failed");
            None
        }
    }
}

fn write_csv(rows: &[TableRow], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = String::from("Filesystem,Usage(%),Mounted on\n");
    for row in rows {
        out.push_str(&format!(
            "{},{:.4},{}\n",
            row.filesystem, row.usage_percent, row.mount
        ));
    }
    fs::write(path, out).with_context(|| format!("write {}", path.display()))
}

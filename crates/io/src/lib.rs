use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};
use tracing::{debug, warn};

use model::*;
use replay_core::{ReplayConfig, ReplaySnapshot};

pub fn import_bundle_json(path: &Path) -> Result<ReplayData> {
    let f = File::open(path).with_context(|| format!("opening replay bundle {}", path.display()))?;
    let data: ReplayData = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parsing replay bundle {}", path.display()))?;
    debug!(
        frames = data.frames.len(),
        statuses = data.track_statuses.len(),
        reference_points = data.reference_lap.len(),
        "loaded replay bundle"
    );
    Ok(data)
}

pub fn import_frames_ndjson(path: &Path) -> Result<Vec<Frame>> {
    let f = File::open(path).with_context(|| format!("opening frames {}", path.display()))?;
    let rdr = BufReader::new(f);
    let mut frames = vec![];
    for (n, line) in rdr.lines().enumerate() {
        let s = line?;
        if s.trim().is_empty() {
            continue;
        }
        let fr: Frame = serde_json::from_str(&s)
            .with_context(|| format!("{}:{}: bad frame", path.display(), n + 1))?;
        frames.push(fr);
    }
    Ok(frames)
}

pub fn import_track_statuses_csv(path: &Path) -> Result<Vec<TrackStatusInterval>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("opening track statuses {}", path.display()))?;
    let mut out = Vec::<TrackStatusInterval>::new();
    for rec in rdr.deserialize() {
        let r: StatusRow = rec?;
        let status = match r.status.parse::<TrackStatus>() {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, start_time = r.start_time, "treating unknown status as green");
                TrackStatus::Green
            }
        };
        if out.last().map_or(false, |prev| r.start_time < prev.start_time) {
            warn!(start_time = r.start_time, "track status start times go backwards");
        }
        out.push(TrackStatusInterval { start_time: r.start_time, end_time: r.end_time, status });
    }
    Ok(out)
}

pub fn import_reference_lap_csv(path: &Path) -> Result<Vec<Point2>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("opening reference lap {}", path.display()))?;
    let mut pts = Vec::new();
    for rec in rdr.deserialize() {
        let r: XyRow = rec?;
        pts.push(Point2 { x: r.x, y: r.y });
    }
    Ok(pts)
}

pub fn load_config(path: &Path) -> Result<ReplayConfig> {
    let f = File::open(path).with_context(|| format!("opening config {}", path.display()))?;
    let cfg: ReplayConfig = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parsing config {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn export_snapshots_ndjson(snapshots: &[ReplaySnapshot], path: &Path) -> Result<()> {
    let f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut w = BufWriter::new(f);
    for s in snapshots {
        let line = serde_json::to_string(s)?;
        writeln!(w, "{}", line)?;
    }
    w.flush()?;
    Ok(())
}

#[derive(Serialize, Deserialize)]
struct StatusRow {
    start_time: f64,
    end_time: Option<f64>,
    status: String,
}

#[derive(Serialize, Deserialize)]
struct XyRow {
    #[serde(rename = "X", alias = "x")]
    x: f64,
    #[serde(rename = "Y", alias = "y")]
    y: f64,
}

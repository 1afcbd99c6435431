mod runner;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use model::{ReplayData, SessionMeta};
use replay_core::{ReplayConfig, ReplaySession, Viewport};

#[derive(Parser, Debug)]
#[command(name = "f1-replay", version)]
#[command(about = "Replay recorded race telemetry headlessly and report the running order")]
struct Cli {
    /// JSON bundle holding meta, frames, track statuses and the reference lap
    #[arg(long, conflicts_with_all = ["frames", "statuses", "reference_lap"])]
    bundle: Option<PathBuf>,

    /// Frames as NDJSON, one frame per line
    #[arg(long, requires = "reference_lap")]
    frames: Option<PathBuf>,

    /// Track status intervals as CSV (start_time,end_time,status)
    #[arg(long)]
    statuses: Option<PathBuf>,

    /// Reference lap as CSV (X,Y)
    #[arg(long)]
    reference_lap: Option<PathBuf>,

    /// Session title when not loading a bundle
    #[arg(long, default_value = "Race Replay")]
    title: String,

    /// Race distance in laps when not loading a bundle
    #[arg(long)]
    total_laps: Option<u32>,

    /// Config file (JSON); defaults to <config dir>/f1-replay/config.json when present
    #[arg(long, env = "F1_REPLAY_CONFIG")]
    config: Option<PathBuf>,

    /// Circuit rotation in degrees
    #[arg(long)]
    rotation: Option<f64>,

    /// Initial playback speed multiplier
    #[arg(long)]
    speed: Option<f64>,

    #[arg(long, default_value_t = 1920.0)]
    width: f64,

    #[arg(long, default_value_t = 1080.0)]
    height: f64,

    /// Simulated render ticks per second
    #[arg(long, default_value_t = 60.0)]
    tick_hz: f64,

    /// Wall-clock seconds to simulate; runs to the last frame when omitted
    #[arg(long)]
    duration: Option<f64>,

    /// Log the leaderboard every N ticks
    #[arg(long, default_value_t = 60)]
    report_every: u64,

    /// Leaderboard rows to log
    #[arg(long, default_value_t = 5)]
    top: usize,

    /// Write every reported snapshot to this NDJSON file
    #[arg(long)]
    snapshots: Option<PathBuf>,

    /// Sleep between ticks so playback runs at wall-clock pace
    #[arg(long)]
    realtime: bool,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn default_config_path() -> Option<PathBuf> {
    let p = dirs_next::config_dir()?.join("f1-replay").join("config.json");
    p.exists().then_some(p)
}

fn load_config(cli: &Cli) -> Result<ReplayConfig> {
    let mut cfg = match cli.config.clone().or_else(default_config_path) {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            iox::load_config(&path)?
        }
        None => ReplayConfig::default(),
    };
    if let Some(r) = cli.rotation {
        cfg.rotation_deg = r;
    }
    if let Some(s) = cli.speed {
        cfg.playback_speed = s;
    }
    cfg.validate().context("invalid configuration after command-line overrides")?;
    Ok(cfg)
}

fn load_data(cli: &Cli) -> Result<ReplayData> {
    if let Some(bundle) = &cli.bundle {
        return iox::import_bundle_json(bundle);
    }
    let (Some(frames), Some(lap)) = (&cli.frames, &cli.reference_lap) else {
        bail!("either --bundle or --frames with --reference-lap is required");
    };
    let track_statuses = match &cli.statuses {
        Some(p) => iox::import_track_statuses_csv(p)?,
        None => Vec::new(),
    };
    Ok(ReplayData {
        meta: SessionMeta::new(cli.title.clone(), cli.total_laps),
        frames: iox::import_frames_ndjson(frames)?,
        track_statuses,
        reference_lap: iox::import_reference_lap_csv(lap)?,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("f1_replay={0},replay_core={0},replay_io={0}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if !(cli.tick_hz.is_finite() && cli.tick_hz > 0.0) {
        bail!("--tick-hz must be positive, got {}", cli.tick_hz);
    }

    let cfg = load_config(&cli)?;
    let data = load_data(&cli)?;
    let viewport = Viewport::new(cli.width, cli.height, cfg.left_margin, cfg.right_margin);
    let session = ReplaySession::new(data, &cfg, viewport).context("building replay session")?;

    let opts = runner::RunOptions {
        tick_hz: cli.tick_hz,
        duration_s: cli.duration,
        report_every: cli.report_every.max(1),
        top: cli.top,
        realtime: cli.realtime,
        keep_snapshots: cli.snapshots.is_some(),
    };
    let snapshots = runner::run(session, &opts);

    if let Some(path) = &cli.snapshots {
        iox::export_snapshots_ndjson(&snapshots, path)?;
        info!(count = snapshots.len(), path = %path.display(), "wrote snapshots");
    }
    Ok(())
}

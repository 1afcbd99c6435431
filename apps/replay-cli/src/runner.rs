use std::{thread, time::Duration};

use replay_core::{ReplaySession, ReplaySnapshot};
use tracing::info;

pub struct RunOptions {
    pub tick_hz: f64,
    pub duration_s: Option<f64>,
    pub report_every: u64,
    pub top: usize,
    pub realtime: bool,
    pub keep_snapshots: bool,
}

/// Drives the session with fixed-length ticks, one `tick` call per step.
pub fn run(mut session: ReplaySession, opts: &RunOptions) -> Vec<ReplaySnapshot> {
    let dt = 1.0 / opts.tick_hz;
    let max_ticks = opts.duration_s.map(|d| (d.max(0.0) * opts.tick_hz).ceil() as u64);
    let mut kept = Vec::new();
    let mut n: u64 = 0;

    loop {
        let done = match max_ticks {
            Some(m) => n >= m,
            None => session.is_at_end(),
        };
        if n % opts.report_every == 0 || done {
            let snap = session.snapshot();
            report(&snap, opts.top);
            if opts.keep_snapshots {
                kept.push(snap);
            }
        }
        if done {
            break;
        }

        session.tick(dt);
        n += 1;
        if opts.realtime {
            thread::sleep(Duration::from_secs_f64(dt));
        }
    }

    info!(ticks = n, frame = session.clock().active_frame(), "replay finished");
    kept
}

fn report(snap: &ReplaySnapshot, top: usize) {
    let order: Vec<String> = snap
        .ranking
        .iter()
        .take(top)
        .enumerate()
        .map(|(i, e)| {
            if e.out {
                format!("{}. {} OUT", i + 1, e.driver_code)
            } else {
                format!("{}. {}", i + 1, e.driver_code)
            }
        })
        .collect();

    info!(
        time = %snap.race_time,
        lap = %snap.lap_label,
        status = %snap.status,
        speed = snap.playback.speed,
        "{}",
        order.join("  ")
    );
    if let Some(banner) = &snap.banner {
        info!("{}", banner);
    }
}

//! Per-frame race state: track status and driver ranking.

use std::cmp::Ordering;

use model::{Frame, TrackStatus, TrackStatusInterval};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::reference::ReferenceCurve;

/// Status of the first interval containing `t`, in list order; green if none does.
pub fn resolve_status(t: f64, intervals: &[TrackStatusInterval]) -> TrackStatus {
    intervals
        .iter()
        .find(|iv| iv.contains(t))
        .map(|iv| iv.status)
        .unwrap_or_default()
}

/// Status intervals in the order the feed supplied them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusTimeline {
    intervals: Vec<TrackStatusInterval>,
}

impl StatusTimeline {
    pub fn new(intervals: Vec<TrackStatusInterval>) -> Self {
        if intervals.windows(2).any(|w| w[1].start_time < w[0].start_time) {
            warn!(count = intervals.len(), "track status intervals are not ordered by start time");
        }
        Self { intervals }
    }

    pub fn resolve(&self, t: f64) -> TrackStatus {
        resolve_status(t, &self.intervals)
    }

    pub fn intervals(&self) -> &[TrackStatusInterval] {
        &self.intervals
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ProgressEntry {
    pub driver_code: String,
    /// Distance covered since the start, metres.
    pub progress_m: f64,
    pub lap: u32,
    pub out: bool,
}

/// Orders the drivers of `frame` by distance covered, furthest first.
///
/// Progress is completed laps times the lap length plus the car's projected
/// position on the reference curve. Equal progress keeps frame order.
pub fn rank_drivers(frame: &Frame, curve: &ReferenceCurve) -> Vec<ProgressEntry> {
    let lap_len = curve.total_length();
    let mut entries: Vec<ProgressEntry> = frame
        .drivers
        .iter()
        .map(|(code, pose)| {
            let completed = pose.lap.max(1) - 1;
            ProgressEntry {
                driver_code: code.clone(),
                progress_m: completed as f64 * lap_len + curve.project(&pose.position()),
                lap: pose.lap,
                out: pose.is_out(),
            }
        })
        .collect();

    // sort_by is stable
    entries.sort_by(|a, b| b.progress_m.partial_cmp(&a.progress_m).unwrap_or(Ordering::Equal));
    entries
}

/// Leader's code and its own reported lap, or lap 1 with no drivers.
pub fn leader(ranking: &[ProgressEntry]) -> (Option<&str>, u32) {
    match ranking.first() {
        Some(e) => (Some(e.driver_code.as_str()), e.lap),
        None => (None, 1),
    }
}

pub fn format_race_time(t: f64) -> String {
    let total = t.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

pub fn lap_label(lap: u32, total_laps: Option<u32>) -> String {
    match total_laps {
        Some(total) => format!("Lap: {}/{}", lap, total),
        None => format!("Lap: {}", lap),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use model::{CarPose, Point2};

    fn pose(x: f64, y: f64, lap: u32) -> CarPose {
        CarPose { x, y, lap, speed: 0.0, gear: 0, drs: 0, tyre: String::new(), rel_dist: 0.0 }
    }

    fn straight_track(len: f64) -> ReferenceCurve {
        ReferenceCurve::build(&[Point2::new(0.0, 0.0), Point2::new(len, 0.0)], 1001).unwrap()
    }

    fn frame(drivers: Vec<(&str, CarPose)>) -> Frame {
        let drivers: IndexMap<String, CarPose> =
            drivers.into_iter().map(|(c, p)| (c.to_string(), p)).collect();
        Frame { t: 0.0, drivers, weather: None }
    }

    #[test]
    fn test_resolve_half_open_intervals() {
        let ivs = vec![
            TrackStatusInterval { start_time: 0.0, end_time: Some(10.0), status: TrackStatus::Yellow },
            TrackStatusInterval { start_time: 10.0, end_time: None, status: TrackStatus::Green },
        ];
        assert_eq!(resolve_status(5.0, &ivs), TrackStatus::Yellow);
        assert_eq!(resolve_status(10.0, &ivs), TrackStatus::Green);
        assert_eq!(resolve_status(0.0, &ivs), TrackStatus::Yellow);
        assert_eq!(resolve_status(-1.0, &ivs), TrackStatus::Green);
    }

    #[test]
    fn test_resolve_first_match_wins_on_overlap() {
        let ivs = vec![
            TrackStatusInterval { start_time: 0.0, end_time: Some(100.0), status: TrackStatus::SafetyCar },
            TrackStatusInterval { start_time: 50.0, end_time: Some(60.0), status: TrackStatus::Red },
        ];
        let tl = StatusTimeline::new(ivs);
        assert_eq!(tl.resolve(55.0), TrackStatus::SafetyCar);
        assert_eq!(tl.resolve(100.0), TrackStatus::Green);
    }

    #[test]
    fn test_lap_count_outweighs_position() {
        let curve = straight_track(1000.0);
        let f = frame(vec![("B", pose(900.0, 0.0, 1)), ("A", pose(50.0, 0.0, 2))]);
        let ranking = rank_drivers(&f, &curve);
        assert_eq!(ranking[0].driver_code, "A");
        assert!((ranking[0].progress_m - 1050.0).abs() < 1e-6);
        assert!((ranking[1].progress_m - 900.0).abs() < 1e-6);
        assert_eq!(leader(&ranking), (Some("A"), 2));
    }

    #[test]
    fn test_ties_keep_frame_order() {
        let curve = straight_track(1000.0);
        let f = frame(vec![
            ("ZHO", pose(10.0, 0.0, 1)),
            ("ALB", pose(10.0, 0.0, 1)),
            ("HAM", pose(10.0, 0.0, 1)),
        ]);
        let codes: Vec<String> = rank_drivers(&f, &curve).into_iter().map(|e| e.driver_code).collect();
        assert_eq!(codes, vec!["ZHO", "ALB", "HAM"]);
    }

    #[test]
    fn test_lap_zero_counts_as_first_lap() {
        let curve = straight_track(1000.0);
        let f = frame(vec![("X", pose(200.0, 0.0, 0))]);
        let ranking = rank_drivers(&f, &curve);
        assert!((ranking[0].progress_m - 200.0).abs() < 1e-6);
        assert_eq!(ranking[0].lap, 0);
    }

    #[test]
    fn test_out_flag() {
        let curve = straight_track(100.0);
        let mut p = pose(10.0, 0.0, 3);
        p.rel_dist = 1.0;
        let ranking = rank_drivers(&frame(vec![("OUT", p)]), &curve);
        assert!(ranking[0].out);
    }

    #[test]
    fn test_empty_frame_leader() {
        let curve = straight_track(100.0);
        let ranking = rank_drivers(&frame(vec![]), &curve);
        assert!(ranking.is_empty());
        assert_eq!(leader(&ranking), (None, 1));
    }

    #[test]
    fn test_hud_strings() {
        assert_eq!(format_race_time(3725.9), "01:02:05");
        assert_eq!(format_race_time(0.0), "00:00:00");
        assert_eq!(lap_label(12, Some(57)), "Lap: 12/57");
        assert_eq!(lap_label(3, None), "Lap: 3");
    }
}

//! Session controller tying the replay components together.
//!
//! The session is the only owner of mutable playback and viewport state. Track
//! geometry and the reference curve are built once and only lent out.

use model::{DrsState, Frame, Point2, ReplayData, SessionMeta, TrackStatus, WeatherSample};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clock::{PlaybackClock, PlaybackCommand, PlaybackState};
use crate::config::ReplayConfig;
use crate::error::{ReplayError, Result};
use crate::geometry::{TrackGeometry, TrackOutline};
use crate::race_state::{format_race_time, lap_label, leader, rank_drivers, ProgressEntry, StatusTimeline};
use crate::reference::ReferenceCurve;
use crate::viewport::{Viewport, ViewportTransform};

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct DriverInfo {
    pub code: String,
    pub speed: f64,
    pub gear: u8,
    pub drs: DrsState,
    pub lap: u32,
    pub tyre: String,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct CarMarker {
    pub code: String,
    pub screen: Point2,
}

/// Everything a renderer reads in one tick, detached from the session.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ReplaySnapshot {
    pub t: f64,
    pub frame: usize,
    pub playback: PlaybackState,
    pub status: TrackStatus,
    pub banner: Option<String>,
    pub race_time: String,
    pub lap_label: String,
    pub leader: Option<String>,
    pub ranking: Vec<ProgressEntry>,
    pub cars: Vec<CarMarker>,
    /// Some frame in the session carries weather, so the panel stays up
    /// even when this one does not.
    pub has_weather: bool,
    pub weather: Option<WeatherSample>,
    pub selected: Option<DriverInfo>,
}

#[derive(Debug)]
pub struct ReplaySession {
    meta: SessionMeta,
    frames: Vec<Frame>,
    timeline: StatusTimeline,
    geometry: TrackGeometry,
    curve: ReferenceCurve,
    outline: TrackOutline,
    transform: ViewportTransform,
    clock: PlaybackClock,
    screen_inner: Vec<Point2>,
    screen_outer: Vec<Point2>,
    selected: Option<String>,
    has_weather: bool,
}

impl ReplaySession {
    pub fn new(data: ReplayData, config: &ReplayConfig, viewport: Viewport) -> Result<Self> {
        config.validate()?;
        if data.frames.is_empty() {
            return Err(ReplayError::EmptySession);
        }
        let has_weather = data.has_weather();

        let geometry = TrackGeometry::build(&data.reference_lap, config.track_half_width_m)?;
        let curve = ReferenceCurve::build(geometry.centerline(), config.reference_points)?;
        let outline = TrackOutline::new(&geometry, config.outline_points);
        let transform = ViewportTransform::fit(
            geometry.bounds(),
            outline.points(),
            config.rotation_rad(),
            config.padding,
            viewport,
        );
        let clock = PlaybackClock::new(data.frames.len(), config)?;

        info!(
            session = %data.meta.id,
            title = %data.meta.title,
            frames = data.frames.len(),
            lap_length_m = curve.total_length(),
            "replay session ready"
        );

        let mut session = Self {
            meta: data.meta,
            frames: data.frames,
            timeline: StatusTimeline::new(data.track_statuses),
            geometry,
            curve,
            outline,
            transform,
            clock,
            screen_inner: Vec::new(),
            screen_outer: Vec::new(),
            selected: None,
            has_weather,
        };
        session.refresh_screen_outline();
        Ok(session)
    }

    fn refresh_screen_outline(&mut self) {
        self.screen_inner = self.transform.screen_polyline(&self.outline.inner);
        self.screen_outer = self.transform.screen_polyline(&self.outline.outer);
    }

    /// Advances playback by one tick's elapsed wall-clock time.
    pub fn tick(&mut self, elapsed_s: f64) {
        self.clock.advance(elapsed_s);
    }

    pub fn command(&mut self, cmd: PlaybackCommand) -> Result<()> {
        debug!(?cmd, "playback command");
        self.clock.apply(cmd)
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.transform.update(self.outline.points(), viewport);
        self.refresh_screen_outline();
    }

    pub fn set_rotation_deg(&mut self, degrees: f64) {
        self.transform.set_rotation(self.outline.points(), degrees.to_radians());
        self.refresh_screen_outline();
    }

    pub fn select_driver(&mut self, code: Option<&str>) {
        self.selected = code.map(str::to_string);
    }

    pub fn selected_driver(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn active_frame(&self) -> &Frame {
        // the clock never reports an index past its frame count
        &self.frames[self.clock.active_frame().min(self.frames.len() - 1)]
    }

    pub fn track_status(&self) -> TrackStatus {
        self.timeline.resolve(self.active_frame().t)
    }

    pub fn ranking(&self) -> Vec<ProgressEntry> {
        rank_drivers(self.active_frame(), &self.curve)
    }

    pub fn driver_info(&self) -> Option<DriverInfo> {
        let code = self.selected.as_ref()?;
        let pose = self.active_frame().drivers.get(code)?;
        Some(DriverInfo {
            code: code.clone(),
            speed: pose.speed,
            gear: pose.gear,
            drs: pose.drs_state(),
            lap: pose.lap,
            tyre: pose.tyre.clone(),
        })
    }

    pub fn world_to_screen(&self, p: &Point2) -> Point2 {
        self.transform.world_to_screen(p)
    }

    pub fn screen_inner(&self) -> &[Point2] {
        &self.screen_inner
    }

    pub fn screen_outer(&self) -> &[Point2] {
        &self.screen_outer
    }

    pub fn snapshot(&self) -> ReplaySnapshot {
        let frame = self.active_frame();
        let ranking = self.ranking();
        let (leader_code, leader_lap) = leader(&ranking);
        let status = self.track_status();
        let cars = frame
            .drivers
            .iter()
            .map(|(code, pose)| CarMarker {
                code: code.clone(),
                screen: self.transform.world_to_screen(&pose.position()),
            })
            .collect();

        ReplaySnapshot {
            t: frame.t,
            frame: self.clock.active_frame(),
            playback: self.clock.state(),
            status,
            banner: status.banner().map(str::to_string),
            race_time: format_race_time(frame.t),
            lap_label: lap_label(leader_lap, self.meta.total_laps),
            leader: leader_code.map(str::to_string),
            cars,
            has_weather: self.has_weather,
            weather: frame.weather.clone(),
            selected: self.driver_info(),
            ranking,
        }
    }

    pub fn meta(&self) -> &SessionMeta {
        &self.meta
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn geometry(&self) -> &TrackGeometry {
        &self.geometry
    }

    pub fn reference_curve(&self) -> &ReferenceCurve {
        &self.curve
    }

    pub fn transform(&self) -> &ViewportTransform {
        &self.transform
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn has_weather(&self) -> bool {
        self.has_weather
    }

    pub fn is_at_end(&self) -> bool {
        self.clock.active_frame() + 1 >= self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use indexmap::IndexMap;
    use model::{CarPose, TrackStatusInterval};

    fn square(side: f64, n: usize) -> Vec<Point2> {
        let per = n / 4;
        let mut pts = Vec::new();
        for i in 0..per {
            pts.push(Point2::new(side * i as f64 / per as f64, 0.0));
        }
        for i in 0..per {
            pts.push(Point2::new(side, side * i as f64 / per as f64));
        }
        for i in 0..per {
            pts.push(Point2::new(side - side * i as f64 / per as f64, side));
        }
        for i in 0..=per {
            pts.push(Point2::new(0.0, side - side * i as f64 / per as f64));
        }
        pts
    }

    fn car(x: f64, y: f64, lap: u32) -> CarPose {
        CarPose { x, y, lap, speed: 250.0, gear: 7, drs: 12, tyre: "SOFT".into(), rel_dist: 0.0 }
    }

    fn data() -> ReplayData {
        let frames = (0..100)
            .map(|i| {
                let d = i as f64 * 10.0;
                let mut drivers = IndexMap::new();
                drivers.insert("VER".to_string(), car(d.min(250.0), 0.0, 1));
                drivers.insert("HAM".to_string(), car((d * 0.5).min(250.0), 0.0, 1));
                Frame { t: i as f64 / 25.0, drivers, weather: None }
            })
            .collect();
        ReplayData {
            meta: SessionMeta::new("Test GP", Some(3)),
            frames,
            track_statuses: vec![
                TrackStatusInterval { start_time: 0.0, end_time: Some(1.0), status: TrackStatus::Yellow },
                TrackStatusInterval { start_time: 1.0, end_time: None, status: TrackStatus::Green },
            ],
            reference_lap: square(250.0, 40),
        }
    }

    fn session() -> ReplaySession {
        let cfg = ReplayConfig { reference_points: 1000, outline_points: 200, ..Default::default() };
        ReplaySession::new(data(), &cfg, Viewport::new(1600.0, 900.0, 340.0, 260.0)).unwrap()
    }

    #[test]
    fn test_rejects_empty_frames() {
        let mut d = data();
        d.frames.clear();
        let err = ReplaySession::new(d, &ReplayConfig::default(), Viewport::new(800.0, 600.0, 0.0, 0.0))
            .unwrap_err();
        assert_eq!(err, ReplayError::EmptySession);
    }

    #[test]
    fn test_rejects_short_reference_lap() {
        let mut d = data();
        d.reference_lap.truncate(1);
        let err = ReplaySession::new(d, &ReplayConfig::default(), Viewport::new(800.0, 600.0, 0.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, ReplayError::TooFewPoints { .. }));
    }

    #[test]
    fn test_tick_and_status() {
        let mut s = session();
        assert_eq!(s.track_status(), TrackStatus::Yellow);
        s.tick(1.0);
        // 1 s at 25 fps
        assert_eq!(s.clock().active_frame(), 25);
        assert_abs_diff_eq!(s.active_frame().t, 1.0);
        assert_eq!(s.track_status(), TrackStatus::Green);
    }

    #[test]
    fn test_snapshot_ranks_and_labels() {
        let mut s = session();
        s.tick(0.4);
        let snap = s.snapshot();
        assert_eq!(snap.frame, 10);
        assert_eq!(snap.leader.as_deref(), Some("VER"));
        assert_eq!(snap.ranking.len(), 2);
        assert_eq!(snap.lap_label, "Lap: 1/3");
        assert_eq!(snap.race_time, "00:00:00");
        assert_eq!(snap.banner.as_deref(), Some("YELLOW FLAG"));
        assert_eq!(snap.cars.len(), 2);
        assert!(snap.selected.is_none());
        assert!(!snap.has_weather);
    }

    #[test]
    fn test_weather_panel_flag_survives_frames_without_sample() {
        let mut d = data();
        d.frames[50].weather = Some(WeatherSample { air_temp: Some(24.0), ..Default::default() });
        let s = ReplaySession::new(d, &ReplayConfig::default(), Viewport::new(800.0, 600.0, 0.0, 0.0)).unwrap();
        let snap = s.snapshot();
        assert_eq!(snap.frame, 0);
        assert!(snap.weather.is_none());
        assert!(snap.has_weather);
    }

    #[test]
    fn test_resize_refreshes_screen_outline() {
        let mut s = session();
        let before = s.screen_outer().to_vec();
        s.resize(Viewport::new(800.0, 450.0, 100.0, 100.0));
        assert_ne!(before, s.screen_outer());
        assert_eq!(s.screen_outer().len(), 200);
        let c = s.world_to_screen(&s.geometry().bounds().center());
        assert_abs_diff_eq!(c.x, 100.0 + 300.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c.y, 225.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rotation_refits() {
        let mut s = session();
        s.set_rotation_deg(45.0);
        assert_abs_diff_eq!(s.transform().rotation_rad(), 45f64.to_radians());
        let c = s.world_to_screen(&s.geometry().bounds().center());
        assert_abs_diff_eq!(c.x, 340.0 + 500.0, epsilon = 1e-9);
    }

    #[test]
    fn test_selected_driver_info() {
        let mut s = session();
        s.select_driver(Some("HAM"));
        let info = s.driver_info().unwrap();
        assert_eq!(info.drs, DrsState::On);
        assert_eq!(info.gear, 7);
        s.select_driver(Some("NOPE"));
        assert!(s.driver_info().is_none());
        s.select_driver(None);
        assert!(s.selected_driver().is_none());
    }

    #[test]
    fn test_commands_route_to_clock() {
        let mut s = session();
        s.command(PlaybackCommand::TogglePause).unwrap();
        s.tick(1.0);
        assert_eq!(s.clock().active_frame(), 0);
        s.command(PlaybackCommand::FastForward).unwrap();
        assert_eq!(s.clock().active_frame(), 10);
        assert!(s.command(PlaybackCommand::SetSpeed(0.0)).is_err());
        s.command(PlaybackCommand::SeekBy(1000.0)).unwrap();
        assert!(s.is_at_end());
    }
}

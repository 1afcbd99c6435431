use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point2) -> f64 {
        self.distance_sq(other).sqrt()
    }

    pub fn distance_sq(&self, other: &Point2) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn lerp(&self, other: &Point2, t: f64) -> Point2 {
        Point2 {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct BBox {
    pub minx: f64,
    pub maxx: f64,
    pub miny: f64,
    pub maxy: f64,
}

impl BBox {
    /// Box that contains nothing; the identity for [`BBox::union`].
    pub const EMPTY: BBox = BBox {
        minx: f64::INFINITY,
        maxx: f64::NEG_INFINITY,
        miny: f64::INFINITY,
        maxy: f64::NEG_INFINITY,
    };

    pub fn center(&self) -> Point2 {
        Point2 {
            x: (self.minx + self.maxx) / 2.0,
            y: (self.miny + self.maxy) / 2.0,
        }
    }

    pub fn width(&self) -> f64 {
        self.maxx - self.minx
    }

    pub fn height(&self) -> f64 {
        self.maxy - self.miny
    }

    pub fn is_empty(&self) -> bool {
        self.minx > self.maxx || self.miny > self.maxy
    }

    pub fn include(&mut self, p: &Point2) {
        if p.x < self.minx { self.minx = p.x; }
        if p.x > self.maxx { self.maxx = p.x; }
        if p.y < self.miny { self.miny = p.y; }
        if p.y > self.maxy { self.maxy = p.y; }
    }

    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            minx: self.minx.min(other.minx),
            maxx: self.maxx.max(other.maxx),
            miny: self.miny.min(other.miny),
            maxy: self.maxy.max(other.maxy),
        }
    }
}

pub fn bbox_of(pl: &[Point2]) -> BBox {
    let mut b = BBox::EMPTY;
    for p in pl {
        b.include(p);
    }
    b
}

/// Flag state of the circuit over a time interval.
///
/// Deserializes from either the canonical name or the numeric code used by
/// the timing feed. Codes without a flag meaning map to `Green`.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", from = "String")]
pub enum TrackStatus {
    #[default]
    Green,
    Yellow,
    Red,
    SafetyCar,
    VirtualSafetyCar,
}

impl TrackStatus {
    pub fn from_code(code: &str) -> TrackStatus {
        code.parse().unwrap_or(TrackStatus::Green)
    }

    /// Banner text shown while the status is active; green has none.
    pub fn banner(&self) -> Option<&'static str> {
        match self {
            TrackStatus::Green => None,
            TrackStatus::Yellow => Some("YELLOW FLAG"),
            TrackStatus::Red => Some("RED FLAG"),
            TrackStatus::SafetyCar => Some("SAFETY CAR"),
            TrackStatus::VirtualSafetyCar => Some("VIRTUAL SAFETY CAR"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackStatus::Green => "GREEN",
            TrackStatus::Yellow => "YELLOW",
            TrackStatus::Red => "RED",
            TrackStatus::SafetyCar => "SAFETY_CAR",
            TrackStatus::VirtualSafetyCar => "VIRTUAL_SAFETY_CAR",
        }
    }
}

impl fmt::Display for TrackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownTrackStatus(pub String);

impl fmt::Display for UnknownTrackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown track status {:?}", self.0)
    }
}

impl std::error::Error for UnknownTrackStatus {}

impl FromStr for TrackStatus {
    type Err = UnknownTrackStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1" | "GREEN" => Ok(TrackStatus::Green),
            "2" | "YELLOW" => Ok(TrackStatus::Yellow),
            "4" | "SC" | "SAFETY_CAR" => Ok(TrackStatus::SafetyCar),
            "5" | "RED" => Ok(TrackStatus::Red),
            // 6 = VSC deployed, 7 = VSC ending
            "6" | "7" | "VSC" | "VIRTUAL_SAFETY_CAR" => Ok(TrackStatus::VirtualSafetyCar),
            _ => Err(UnknownTrackStatus(s.to_string())),
        }
    }
}

impl From<String> for TrackStatus {
    fn from(s: String) -> Self {
        TrackStatus::from_code(&s)
    }
}

/// Half-open `[start_time, end_time)`; `end_time == None` runs to the end of the session.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct TrackStatusInterval {
    pub start_time: f64,
    #[serde(default)]
    pub end_time: Option<f64>,
    pub status: TrackStatus,
}

impl TrackStatusInterval {
    pub fn contains(&self, t: f64) -> bool {
        self.start_time <= t && self.end_time.map_or(true, |end| t < end)
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DrsState {
    Off,
    Eligible,
    On,
    Unknown,
}

impl DrsState {
    pub fn from_code(code: u8) -> DrsState {
        match code {
            0 | 1 => DrsState::Off,
            8 => DrsState::Eligible,
            10 | 12 | 14 => DrsState::On,
            _ => DrsState::Unknown,
        }
    }
}

impl fmt::Display for DrsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DrsState::Off => "Off",
            DrsState::Eligible => "Eligible",
            DrsState::On => "On",
            DrsState::Unknown => "Unknown",
        })
    }
}

fn first_lap() -> u32 {
    1
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct CarPose {
    pub x: f64,
    pub y: f64,
    #[serde(default = "first_lap")]
    pub lap: u32,
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub gear: u8,
    #[serde(default)]
    pub drs: u8,
    #[serde(default)]
    pub tyre: String,
    #[serde(default)]
    pub rel_dist: f64,
}

impl CarPose {
    pub fn position(&self) -> Point2 {
        Point2 { x: self.x, y: self.y }
    }

    /// The feed pins `rel_dist` at exactly 1.0 for cars no longer running.
    pub fn is_out(&self) -> bool {
        self.rel_dist == 1.0
    }

    pub fn drs_state(&self) -> DrsState {
        DrsState::from_code(self.drs)
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct WeatherSample {
    #[serde(default)]
    pub track_temp: Option<f64>,
    #[serde(default)]
    pub air_temp: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub wind_direction: Option<f64>,
    #[serde(default)]
    pub rain_state: Option<String>,
}

const COMPASS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE",
    "S", "SSW", "SW", "WSW", "W", "WNW", "NW", "NNW",
];

/// 16-point compass name for a bearing in degrees.
pub fn compass_point(degrees: f64) -> &'static str {
    let norm = degrees.rem_euclid(360.0);
    let idx = ((norm / 22.5) + 0.5) as usize % COMPASS.len();
    COMPASS[idx]
}

impl WeatherSample {
    pub fn wind_compass(&self) -> Option<&'static str> {
        self.wind_direction.map(compass_point)
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Frame {
    pub t: f64,
    #[serde(default)]
    pub drivers: IndexMap<String, CarPose>,
    #[serde(default)]
    pub weather: Option<WeatherSample>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct SessionMeta {
    #[serde(with = "uuid::serde::simple", default = "Uuid::new_v4")]
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub total_laps: Option<u32>,
}

impl SessionMeta {
    pub fn new(title: impl Into<String>, total_laps: Option<u32>) -> Self {
        Self { id: Uuid::new_v4(), title: title.into(), total_laps }
    }
}

/// Everything a replay needs, as handed over by the telemetry loader.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ReplayData {
    pub meta: SessionMeta,
    #[serde(default)]
    pub frames: Vec<Frame>,
    #[serde(default)]
    pub track_statuses: Vec<TrackStatusInterval>,
    #[serde(default)]
    pub reference_lap: Vec<Point2>,
}

impl ReplayData {
    pub fn has_weather(&self) -> bool {
        self.frames.iter().any(|f| f.weather.is_some())
    }
}

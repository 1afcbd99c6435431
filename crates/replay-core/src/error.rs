#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReplayError {
    #[error("polyline needs at least {needed} points, got {got}")]
    TooFewPoints { needed: usize, got: usize },
    #[error("coordinate arrays differ in length: {x} x values, {y} y values")]
    MismatchedAxes { x: usize, y: usize },
    #[error("invalid replay configuration: {0}")]
    InvalidConfig(String),
    #[error("playback speed must be positive, got {0}")]
    InvalidSpeed(f64),
    #[error("session has no frames")]
    EmptySession,
}

pub type Result<T> = std::result::Result<T, ReplayError>;

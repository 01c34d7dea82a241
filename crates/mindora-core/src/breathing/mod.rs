pub mod catalog;
mod engine;
mod pattern;
mod snapshot;

pub use catalog::Exercise;
pub use engine::{BreathingEngine, SessionState, DEFAULT_TICK_INTERVAL};
pub use pattern::{BreathPattern, Phase, Termination};
pub use snapshot::SessionSnapshot;

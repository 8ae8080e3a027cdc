pub mod tracker;

pub use tracker::{SessionTracker, TrackerError};

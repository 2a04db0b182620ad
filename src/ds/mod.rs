pub mod ladder;

pub use ladder::{FrequencyLadder, DEFAULT_THRESHOLDS};

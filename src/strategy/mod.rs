//! Pattern detectors for structure breaks and fair-value gaps.

pub mod gap;
pub mod structure;

pub use gap::{GapConfig, GapDetector};
pub use structure::{StructureBreakDetector, StructureConfig};

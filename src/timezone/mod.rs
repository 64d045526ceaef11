//! Timezone coordination module
//!
//! Normalizes player-reported timezones and proposes coordination windows

pub mod analyzer;
pub mod normalize;

pub use analyzer::{analyze, AnalysisResult};
pub use normalize::{normalize_timezone, parse_offset_hours};

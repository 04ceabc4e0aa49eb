pub mod category;
pub mod error;
pub mod keywords;
pub mod report;

pub use crate::category::SoundCategory;
pub use crate::error::DomainError;
pub use crate::keywords::{KeywordRule, KeywordTable, FALLBACK_CATEGORY};
pub use crate::report::{
    CategoryDurations, CategoryPercentages, PracticeReport, WindowClassification, WindowCounts,
};

/// Length of one classifier window in seconds, fixed by the YAMNet frame hop.
pub const WINDOW_SECONDS: f64 = 0.48;

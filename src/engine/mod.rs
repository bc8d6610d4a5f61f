//! Core engine: universe selection, evaluation, watch-list and the
//! periodic discovery / re-check passes.

pub mod alerts;
pub mod evaluator;
pub mod scheduler;
pub mod universe;
pub mod watchlist;

pub use evaluator::{EvaluatorConfig, OpportunityEvaluator};
pub use scheduler::{Scanner, ScannerHandle, ScannerStatus, ScheduleSettings, Shutdown, StatusSnapshot};
pub use universe::UniverseFilter;
pub use watchlist::WatchList;

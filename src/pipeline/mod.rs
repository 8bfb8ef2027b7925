//! The data pipeline behind the dashboard: loading, filtering and analysis

pub mod dispatch;
pub mod filter;
pub mod loader;

pub use dispatch::{AnalysisOutcome, AnalysisRequest, BusyFlag, NoticeLevel, Notification};
pub use filter::{CategoryFilter, FilteredView};
pub use loader::{load_dashboard, LoadLimits, LoadSequencer, Snapshot, SnapshotCell};

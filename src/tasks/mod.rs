//! Background Tasks Module
//!
//! Contains background tasks that run while the file cache is enabled.
//!
//! # Tasks
//! - Scanner: reconciles cached entries with the filesystem on a timer or on demand

mod scanner;

pub use scanner::{spawn_scan_task, ScanTask};

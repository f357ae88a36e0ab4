//! # MyWaitlistr Export Worker
//!
//! Background export of waitlist entries to object storage.
//!
//! ## Modules
//!
//! - `format`: csv / json / xml rendering
//! - `storage`: artifact upload and presigned URLs
//! - `runner`: export queue and dispatch loop
//!
//! ## Example
//!
//! ```no_run
//! use waitlistr_worker::format::ExportFormat;
//!
//! let format: ExportFormat = "csv".parse().unwrap();
//! assert_eq!(format.content_type(), "text/csv");
//! ```

pub mod format;
pub mod runner;
pub mod storage;

pub use format::{ExportFormat, ExportRow};
pub use runner::{ExportQueue, ExportRunner, ExportRunnerConfig, RunnerError};

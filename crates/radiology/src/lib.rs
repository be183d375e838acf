//! Radiology domain module.
//!
//! Imaging order lifecycle, report text handling, worklist ordering and
//! attachment checks (no IO, no HTTP, no storage).

pub mod order;
pub mod report;
pub mod upload;
pub mod worklist;

pub use order::{
    CompleteOrder, ImagingOrder, ImagingOrderCommand, ImagingOrderEvent, ImagingService,
    OrderCompleted, OrderStatus, Priority,
};
pub use report::{ParsedReport, RadiologyReport};
pub use upload::{
    DEFAULT_ACCEPTED_TYPES, DEFAULT_MAX_SIZE_MB, UploadCandidate, UploadRules, format_file_size,
};
pub use worklist::{StatusFilter, WorklistStats, sort_worklist};

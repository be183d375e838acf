//! HMIS page client and client-side workflows.
//!
//! Typed reads of the pharmacy and radiology pages, the actions behind their
//! buttons, and the interaction helpers those pages rely on: debounced search,
//! sequential uploads, single-flight submission and confirmation prompts.

pub mod api;
pub mod config;
pub mod debounce;
pub mod error;
pub mod inertia;
pub mod query;
pub mod submit;
pub mod upload_queue;

pub use api::{AttachmentUploader, HmisClient};
pub use config::ClientConfig;
pub use debounce::{Debouncer, Ticket};
pub use error::{ClientError, ClientResult, FormErrors};
pub use inertia::{InertiaPage, InventoryStats, InventoryView, Worklist};
pub use query::ListQuery;
pub use submit::{AutoConfirm, Confirm, SubmitGuard, require_confirmation};
pub use upload_queue::{Progress, QueuedFile, UploadQueue, UploadReport, UploadStatus, Uploader};

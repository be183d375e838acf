//! Foundation building blocks shared by the HMIS client crates.
//!
//! This crate contains **pure** primitives (no IO): the error model, typed
//! record identifiers, the injected clock and the paginated listing envelope.

pub mod aggregate;
pub mod clock;
pub mod date;
pub mod entity;
pub mod error;
pub mod id;
pub mod page;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot};
pub use clock::{Clock, FixedClock, SystemClock};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{
    AttachmentId, BatchId, ConsumableId, DrugId, ImagingOrderId, LabServiceId, MappingId,
    PrescriptionId, ProcedureId, SupplierId, TariffId,
};
pub use page::{Page, PageLinks, PageMeta};
pub use value_object::ValueObject;

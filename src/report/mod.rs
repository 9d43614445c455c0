//! Report download, field typing and cleaning.

pub mod catalog;
pub mod clean;
pub mod fields;
pub mod pipeline;

pub use catalog::ReportFieldCatalog;
pub use clean::default_clean;
pub use fields::{AdditionalField, Cleaner, FieldSpec, FieldType};
pub use pipeline::{Report, ReportRequest, REPORT_CHUNK_SIZE};

// Macros (must be first for visibility)
#[macro_use]
pub mod macros;

pub mod common;
pub mod config;
pub mod error;
pub mod listing;
pub mod orchestrator;

pub use common::{DryRunTransport, MsrTransport, RegisterTransport, WriteTarget};
pub use config::{PStateEdit, Request};
pub use error::{Result, ZenstateError};
pub use listing::{describe, Listing};
pub use orchestrator::{apply_pstate_edit, set_c6, C6Report, FieldChange, MutationReport, Step};

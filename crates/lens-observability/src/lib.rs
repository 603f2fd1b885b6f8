//! Logging and diagnostics for PriceLens.
//!
//! - [`init_logging`] installs the process-wide `tracing` subscriber in
//!   human or JSON format.
//! - [`Diagnostics`] keeps the recent fallback reasons that never surface as
//!   errors, so a front end can explain why it is showing demo data.

pub mod diagnostics;
pub mod error;
pub mod logging;

pub use diagnostics::{DiagnosticEvent, Diagnostics};
pub use error::ObservabilityError;
pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::diagnostics::{DiagnosticEvent, Diagnostics};
    pub use crate::logging::{init_logging, LogConfig, LogFormat, LogLevel};
    pub use crate::ObservabilityError;
}

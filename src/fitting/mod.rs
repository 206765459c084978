//! fitting — declare a model over bounded observables and fit it to data.
//!
//! Purpose
//! -------
//! Hold everything between raw events and fitted parameters: the shared
//! Observable and Variable handles, column-wise Datasets, the closed set of
//! normalized densities, and the maximum-likelihood fit.
//!
//! Key behaviors
//! -------------
//! - Observables and Variables are shared handles; a PDF and a Dataset built
//!   from the same Observable refer to the same instance, with no registry.
//! - Both ingestion paths (`add_event`, `from_matrix`) keep every stored
//!   value finite and inside its Observable's bounds.
//! - A fit updates its Variables in place only when it converges.
//!
//! Error surface
//! -------------
//! All fallible operations return [`ModelResult`]; [`ModelError::kind`]
//! classifies failures as validation, out-of-domain, domain, convergence, or
//! optimizer errors.
//!
//! [`ModelResult`]: errors::ModelResult
//! [`ModelError::kind`]: errors::ModelError::kind
pub mod core;
pub mod errors;
pub mod models;
pub mod pdf;

pub use self::core::{DataPoint, Dataset, FitOptions, Observable, Variable};
pub use self::errors::{DomainError, ErrorKind, ModelError, ModelResult};
pub use self::models::{FitLogger, FitManager, FitParameter, FitResult, FitState, LogFacade};
pub use self::pdf::{DensityFamily, Pdf, PdfKind};

pub mod prelude {
    pub use super::core::{Dataset, FitOptions, Observable, Variable};
    pub use super::errors::{ModelError, ModelResult};
    pub use super::models::{FitManager, FitResult, LogFacade};
    pub use super::pdf::Pdf;
}

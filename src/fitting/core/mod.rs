//! fitting::core — the building blocks a fit is declared with.
//!
//! - [`Observable`]: bounded measured dimension (shared handle).
//! - [`Variable`]: fit parameter with optional step/bounds (shared handle).
//! - [`Dataset`] / [`DataPoint`]: column-wise event storage and row views.
//! - [`FitOptions`]: optimizer and evaluation settings.
pub mod dataset;
pub mod observable;
pub mod options;
pub mod variable;

pub use self::dataset::{DataPoint, Dataset};
pub use self::observable::Observable;
pub use self::options::FitOptions;
pub use self::variable::Variable;

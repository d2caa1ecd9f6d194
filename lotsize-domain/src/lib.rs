//! Lotsize Domain Layer
//!
//! Pure domain logic with zero I/O dependencies.
//! Contains value objects and the normalization of loosely-typed client input.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Public modules
pub mod inputs;
pub mod numeric;
pub mod value_objects;

// Re-export commonly used types
pub use inputs::{LooseRiskInputs, RiskInputs};
pub use numeric::{coerce_decimal, parse_decimal};
pub use value_objects::{DomainError, LotStep, PairCode};

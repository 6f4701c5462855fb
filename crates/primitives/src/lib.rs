//! Value types shared by the host coordinator and the compiler workers.
//!
//! Everything here is plain data: cursor locations, boundary-inclusive spans,
//! compile outcomes, and the explanation/elaboration payloads that cross the
//! worker boundary. Coordinates are 0-based on this side of the boundary;
//! the wire layer in `lucid-protocol` owns the 1-based conversion.

#![warn(missing_docs)]

pub mod explain;
pub mod location;
pub mod outcome;

pub use explain::{Elaboration, MissingHint};
pub use location::{Location, Span, within_range};
pub use outcome::{CompilationState, CompileError};

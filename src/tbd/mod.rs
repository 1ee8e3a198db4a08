//! Text-based dylib (tbd) generation.
//!
//! This module turns parsed Mach-O images into tbd stubs.
//!
//! # Pipeline
//!
//! 1. **Slice Orchestration** - Splits universal binaries into slices and
//!    drops slices that cannot be parsed
//! 2. **Symbol Classification** - Sorts exported symbols into plain symbols,
//!    Objective-C classes and instance variables
//! 3. **Serialization** - Renders the collected records as tbd v1 text

mod builder;
mod model;
mod symbols;
mod writer;

pub use builder::*;
pub use model::*;
pub use symbols::*;
pub use writer::*;

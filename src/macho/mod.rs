//! Mach-O file format handling.
//!
//! This module provides types and utilities for reading thin and universal
//! Mach-O files: container classification, architecture identification,
//! load-command walking and symbol table decoding.

mod arch;
mod constants;
mod container;
mod context;
mod fat;
mod structs;

pub use arch::*;
pub use constants::*;
pub use container::*;
pub use context::*;
pub use fat::*;
pub use structs::*;

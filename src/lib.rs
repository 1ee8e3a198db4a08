//! machotbd - Generate text-based dylib (tbd) stubs from Mach-O libraries.
//!
//! This library reads a thin or universal Mach-O dynamic library and
//! summarizes what it exports: symbols, Objective-C classes and instance
//! variables, re-exported libraries and its install name and versions. The
//! result can be rendered as a tbd v1 stub for linking against the library
//! without shipping the binary itself.
//!
//! # Features
//!
//! - Memory-mapped input
//! - 32/64-bit images in either byte order
//! - Universal binaries, with unsupported slices skipped
//! - Deterministic output independent of symbol table order
//!
//! # Example
//!
//! ```no_run
//! use machotbd::{generate_tbd, TbdOptions, Platform};
//!
//! fn main() -> machotbd::Result<()> {
//!     let options = TbdOptions {
//!         platform: Platform::Macosx,
//!         ..Default::default()
//!     };
//!
//!     let (text, report) = generate_tbd("/usr/lib/libfoo.dylib", &options)?;
//!     for warning in &report.warnings {
//!         eprintln!("warning: {}", warning);
//!     }
//!     print!("{}", text);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod macho;
pub mod output;
pub mod tbd;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types
pub use error::{Error, Result};
pub use macho::{Architecture, MachOContext};
pub use output::{emit, Emission};
pub use tbd::{
    parse_library, render_tbd, ArchitectureRecord, LibraryDescriptor, ParseReport, Platform,
    Warning,
};

use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tracing::debug;

/// Options for tbd generation.
#[derive(Debug, Clone)]
pub struct TbdOptions {
    /// File to write the stub to; `None` means the console
    pub output_path: Option<PathBuf>,
    /// Print the stub to stdout when no output file is set
    pub echo_to_console: bool,
    /// Platform written into the stub
    pub platform: Platform,
}

impl Default for TbdOptions {
    fn default() -> Self {
        Self {
            output_path: None,
            echo_to_console: true,
            platform: Platform::Ios,
        }
    }
}

impl TbdOptions {
    /// Sets the output file, which turns console echo off.
    pub fn with_output<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_path = Some(path.as_ref().to_path_buf());
        self.echo_to_console = false;
        self
    }
}

/// Reads and parses a Mach-O file.
///
/// The file is memory mapped and parsed in a single pass.
pub fn read_library<P: AsRef<Path>>(path: P, platform: Platform) -> Result<ParseReport> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;

    // SAFETY: the mapping is read-only and dropped before this function returns.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|source| Error::MemoryMap {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("mapped {} ({} bytes)", path.display(), mmap.len());

    parse_library(&mmap, platform)
}

/// Reads a Mach-O file and renders its tbd stub.
///
/// Returns the rendered text together with the parse report so callers can
/// inspect warnings.
pub fn generate_tbd<P: AsRef<Path>>(path: P, options: &TbdOptions) -> Result<(String, ParseReport)> {
    let report = read_library(path, options.platform)?;
    let text = render_tbd(&report.descriptor);
    Ok((text, report))
}

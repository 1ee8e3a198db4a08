//! Error types for Mach-O inspection and tbd generation.
//!
//! Errors fall into two groups: fatal errors that abort the whole operation
//! (unrecognized container, I/O failures, no usable slice) and recoverable
//! errors that only drop a single slice or load command. Recoverable errors
//! are collected as warnings alongside the parsed result.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for tbd generation.
#[derive(Error, Debug)]
pub enum Error {
    // ==================== I/O Errors ====================
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to open file '{path}': {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to memory map file '{path}': {source}")]
    MemoryMap {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write output file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ==================== Container Errors ====================
    #[error("unsupported input format: {reason}")]
    MalformedInput { reason: String },

    #[error("unsupported architecture (cputype {cputype:#x}, cpusubtype {cpusubtype:#x})")]
    UnsupportedArchitecture { cputype: u32, cpusubtype: u32 },

    #[error("slice {index} at {offset:#x}+{size:#x} lies outside the file (size {file_size:#x})")]
    SliceOutOfBounds {
        index: usize,
        offset: u64,
        size: u64,
        file_size: u64,
    },

    #[error("no architecture successfully parsed ({attempted} attempted)")]
    NoArchitectures { attempted: usize },

    // ==================== Load Command Errors ====================
    #[error("load command {index} at offset {offset:#x} is truncated (size {cmdsize}, {available} bytes available)")]
    TruncatedCommand {
        index: u32,
        offset: usize,
        cmdsize: u32,
        available: usize,
    },

    // ==================== Symbol Errors ====================
    #[error("symbol table at {offset:#x}+{size:#x} exceeds image size {available:#x}")]
    SymbolTableOverflow {
        offset: u64,
        size: u64,
        available: usize,
    },

    #[error("string table offset {offset} out of bounds (size: {size})")]
    StringTableOverflow { offset: u64, size: u64 },

    // ==================== Configuration Errors ====================
    #[error("unsupported platform '{0}', only ios and macosx are supported")]
    UnsupportedPlatform(String),

    // ==================== Parse Errors ====================
    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },
}

/// A specialized Result type for tbd generation.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns true if this error only affects one slice or load command.
    ///
    /// Recoverable errors are reported as warnings and never abort the
    /// whole file as long as at least one slice survives.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedArchitecture { .. }
                | Error::TruncatedCommand { .. }
                | Error::SliceOutOfBounds { .. }
                | Error::SymbolTableOverflow { .. }
                | Error::StringTableOverflow { .. }
                | Error::BufferTooSmall { .. }
        )
    }

    /// Creates a malformed input error with a formatted reason.
    #[inline]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Error::MalformedInput {
            reason: reason.into(),
        }
    }

    /// Creates a buffer too small error.
    #[inline]
    pub fn buffer_too_small(needed: usize, available: usize) -> Self {
        Error::BufferTooSmall { needed, available }
    }
}

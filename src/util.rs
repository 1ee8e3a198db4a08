//! Utility functions for binary data processing.
//!
//! This module provides:
//! - Byte-order aware reads (using byteorder for unaligned access)
//! - Null-terminated string extraction (via memchr)
//! - Packed version formatting

use std::fmt;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

// =============================================================================
// Byte Order
// =============================================================================

/// Byte order of a Mach-O image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    /// Least significant byte first (x86, ARM)
    Little,
    /// Most significant byte first (PowerPC, universal headers)
    Big,
}

impl Endian {
    /// Reads a u32 from an unaligned byte slice.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() < 4`.
    #[inline(always)]
    pub fn read_u32(self, data: &[u8]) -> u32 {
        match self {
            Endian::Little => LittleEndian::read_u32(data),
            Endian::Big => BigEndian::read_u32(data),
        }
    }

    /// Reads a u32 at the given offset, returning `None` when out of bounds.
    #[inline]
    pub fn read_u32_at(self, data: &[u8], offset: usize) -> Option<u32> {
        let end = offset.checked_add(4)?;
        data.get(offset..end).map(|bytes| self.read_u32(bytes))
    }

    /// Converts a u32 copied verbatim from the file into host order.
    #[inline(always)]
    pub fn u32(self, raw: u32) -> u32 {
        match self {
            Endian::Little => u32::from_le(raw),
            Endian::Big => u32::from_be(raw),
        }
    }

    /// Converts a u16 copied verbatim from the file into host order.
    #[inline(always)]
    pub fn u16(self, raw: u16) -> u16 {
        match self {
            Endian::Little => u16::from_le(raw),
            Endian::Big => u16::from_be(raw),
        }
    }
}

impl fmt::Display for Endian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endian::Little => f.write_str("little-endian"),
            Endian::Big => f.write_str("big-endian"),
        }
    }
}

// =============================================================================
// Strings
// =============================================================================

/// Finds the position of the first null byte in a slice.
///
/// Returns the slice length if there is no terminator.
#[inline(always)]
pub fn memchr_null(data: &[u8]) -> usize {
    memchr::memchr(0, data).unwrap_or(data.len())
}

/// Extracts a null-terminated string from the start of `data`.
///
/// A missing terminator takes the rest of the slice. Invalid UTF-8 is
/// replaced with U+FFFD, so names that differ only in invalid bytes
/// come out identical.
pub fn cstring(data: &[u8]) -> String {
    let end = memchr_null(data);
    String::from_utf8_lossy(&data[..end]).into_owned()
}

// =============================================================================
// Versions
// =============================================================================

/// A Mach-O packed version number (`xxxx.yy.zz` in 16.8.8 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackedVersion(pub u32);

impl PackedVersion {
    /// Major component (bits 16-31).
    #[inline]
    pub const fn major(self) -> u32 {
        self.0 >> 16
    }

    /// Minor component (bits 8-15).
    #[inline]
    pub const fn minor(self) -> u32 {
        (self.0 >> 8) & 0xFF
    }

    /// Patch component (bits 0-7).
    #[inline]
    pub const fn patch(self) -> u32 {
        self.0 & 0xFF
    }
}

impl fmt::Display for PackedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.patch())
    }
}

/// Formats a raw packed version as `MAJOR.MINOR.PATCH`.
#[inline]
pub fn format_version(raw: u32) -> String {
    PackedVersion(raw).to_string()
}

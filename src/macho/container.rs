//! Container classification from the leading magic number.

use std::fmt;

use super::constants::*;
use crate::util::Endian;

/// Word size of a thin Mach-O image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bits {
    /// 32-bit image (`mach_header`, `nlist`)
    B32,
    /// 64-bit image (`mach_header_64`, `nlist_64`)
    B64,
}

impl Bits {
    /// Size of the Mach-O header for this word size.
    #[inline]
    pub fn header_size(self) -> usize {
        match self {
            Bits::B32 => super::MachHeader::SIZE,
            Bits::B64 => super::MachHeader::SIZE_64,
        }
    }

    /// Size of one symbol table entry for this word size.
    #[inline]
    pub fn nlist_size(self) -> usize {
        match self {
            Bits::B32 => super::Nlist::SIZE,
            Bits::B64 => super::Nlist64::SIZE,
        }
    }
}

impl fmt::Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bits::B32 => f.write_str("32"),
            Bits::B64 => f.write_str("64"),
        }
    }
}

/// What kind of container a file is, judged from its magic number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Single-architecture image
    Thin {
        /// Word size
        bits: Bits,
        /// Byte order of every field after the magic
        endian: Endian,
    },
    /// Universal binary holding several thin images
    Fat,
    /// Anything else
    Unrecognized(u32),
}

impl ContainerKind {
    /// Classifies the first four bytes of a file.
    ///
    /// The magic is read big-endian; a byte-swapped magic means the image
    /// is little-endian.
    pub fn from_magic(magic: [u8; 4]) -> Self {
        match u32::from_be_bytes(magic) {
            MH_MAGIC => ContainerKind::Thin {
                bits: Bits::B32,
                endian: Endian::Big,
            },
            MH_CIGAM => ContainerKind::Thin {
                bits: Bits::B32,
                endian: Endian::Little,
            },
            MH_MAGIC_64 => ContainerKind::Thin {
                bits: Bits::B64,
                endian: Endian::Big,
            },
            MH_CIGAM_64 => ContainerKind::Thin {
                bits: Bits::B64,
                endian: Endian::Little,
            },
            FAT_MAGIC => ContainerKind::Fat,
            other => ContainerKind::Unrecognized(other),
        }
    }

    /// Classifies the start of a buffer; short buffers are unrecognized.
    pub fn detect(data: &[u8]) -> Self {
        match data.get(..4) {
            Some(&[a, b, c, d]) => Self::from_magic([a, b, c, d]),
            _ => ContainerKind::Unrecognized(0),
        }
    }
}

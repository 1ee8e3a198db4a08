//! Mach-O binary structures.
//!
//! These structures match the on-disk format of Mach-O files. Thin-image
//! structures are copied verbatim and then converted with `to_host`, since
//! the byte order is only known at runtime. Universal headers are always
//! big-endian and use zerocopy's fixed byte-order integers directly.

use std::fmt;

use zerocopy::byteorder::big_endian::U32 as BeU32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::util::Endian;

// =============================================================================
// Header Structures
// =============================================================================

/// Mach-O header.
///
/// The 64-bit header has the same leading fields followed by a reserved
/// word; only the header size differs.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct MachHeader {
    /// Magic number
    pub magic: u32,
    /// CPU type
    pub cputype: u32,
    /// CPU subtype
    pub cpusubtype: u32,
    /// File type
    pub filetype: u32,
    /// Number of load commands
    pub ncmds: u32,
    /// Size of load commands
    pub sizeofcmds: u32,
    /// Flags
    pub flags: u32,
}

impl MachHeader {
    /// Size of the 32-bit header in bytes.
    pub const SIZE: usize = 28;

    /// Size of the 64-bit header in bytes.
    pub const SIZE_64: usize = 32;

    /// Converts every field into host byte order.
    pub fn to_host(self, endian: Endian) -> Self {
        Self {
            magic: endian.u32(self.magic),
            cputype: endian.u32(self.cputype),
            cpusubtype: endian.u32(self.cpusubtype),
            filetype: endian.u32(self.filetype),
            ncmds: endian.u32(self.ncmds),
            sizeofcmds: endian.u32(self.sizeofcmds),
            flags: endian.u32(self.flags),
        }
    }
}

// =============================================================================
// Universal Header
// =============================================================================

/// Universal binary header.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct FatHeader {
    /// FAT_MAGIC
    pub magic: BeU32,
    /// Number of architecture slices that follow
    pub nfat_arch: BeU32,
}

impl FatHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 8;
}

/// Universal binary architecture entry.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct FatArch {
    /// CPU type
    pub cputype: BeU32,
    /// CPU subtype
    pub cpusubtype: BeU32,
    /// File offset of the slice
    pub offset: BeU32,
    /// Size of the slice
    pub size: BeU32,
    /// Alignment (power of 2)
    pub align: BeU32,
}

impl FatArch {
    /// Size of an architecture entry.
    pub const SIZE: usize = 20;
}

// =============================================================================
// Symbol Table Command
// =============================================================================

/// Symbol table command.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct SymtabCommand {
    /// LC_SYMTAB
    pub cmd: u32,
    /// Size of this load command
    pub cmdsize: u32,
    /// Symbol table offset
    pub symoff: u32,
    /// Number of symbol table entries
    pub nsyms: u32,
    /// String table offset
    pub stroff: u32,
    /// String table size in bytes
    pub strsize: u32,
}

impl SymtabCommand {
    /// Size of this command.
    pub const SIZE: usize = 24;

    /// Converts every field into host byte order.
    pub fn to_host(self, endian: Endian) -> Self {
        Self {
            cmd: endian.u32(self.cmd),
            cmdsize: endian.u32(self.cmdsize),
            symoff: endian.u32(self.symoff),
            nsyms: endian.u32(self.nsyms),
            stroff: endian.u32(self.stroff),
            strsize: endian.u32(self.strsize),
        }
    }
}

// =============================================================================
// Dylib Command
// =============================================================================

/// Dylib load command (LC_ID_DYLIB, LC_REEXPORT_DYLIB, ...).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct DylibCommand {
    /// Command type
    pub cmd: u32,
    /// Total size (includes path string)
    pub cmdsize: u32,
    /// Library's path name offset from the start of the command
    pub name_offset: u32,
    /// Library's build timestamp
    pub timestamp: u32,
    /// Library's current version number
    pub current_version: u32,
    /// Library's compatibility version number
    pub compatibility_version: u32,
}

impl DylibCommand {
    /// Minimum size of this command (without path string).
    pub const SIZE: usize = 24;

    /// Converts every field into host byte order.
    pub fn to_host(self, endian: Endian) -> Self {
        Self {
            cmd: endian.u32(self.cmd),
            cmdsize: endian.u32(self.cmdsize),
            name_offset: endian.u32(self.name_offset),
            timestamp: endian.u32(self.timestamp),
            current_version: endian.u32(self.current_version),
            compatibility_version: endian.u32(self.compatibility_version),
        }
    }
}

// =============================================================================
// Symbol Table Entries
// =============================================================================

/// 32-bit symbol table entry.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct Nlist {
    /// Index into string table
    pub n_strx: u32,
    /// Type flag
    pub n_type: u8,
    /// Section number or NO_SECT
    pub n_sect: u8,
    /// Flags (see <mach-o/stab.h>)
    pub n_desc: u16,
    /// Value
    pub n_value: u32,
}

impl Nlist {
    /// Size of an nlist entry.
    pub const SIZE: usize = 12;
}

/// 64-bit symbol table entry.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct Nlist64 {
    /// Index into string table
    pub n_strx: u32,
    /// Type flag
    pub n_type: u8,
    /// Section number or NO_SECT
    pub n_sect: u8,
    /// Flags (see <mach-o/stab.h>)
    pub n_desc: u16,
    /// Value
    pub n_value: u64,
}

impl Nlist64 {
    /// Size of an nlist entry.
    pub const SIZE: usize = 16;
}

// =============================================================================
// Display Implementations
// =============================================================================

impl fmt::Display for MachHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MachO {{ cpu: {:#x}/{:#x}, type: {:#x}, cmds: {}, flags: {:#x} }}",
            self.cputype, self.cpusubtype, self.filetype, self.ncmds, self.flags
        )
    }
}

impl fmt::Display for FatArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FatArch {{ cpu: {:#x}/{:#x}, file: {:#x}+{:#x} }}",
            self.cputype.get(),
            self.cpusubtype.get(),
            self.offset.get(),
            self.size.get()
        )
    }
}

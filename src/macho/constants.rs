//! Mach-O constants and flags.

// =============================================================================
// Magic Numbers
// =============================================================================

/// 32-bit Mach-O magic, as read big-endian from a big-endian image
pub const MH_MAGIC: u32 = 0xFEEDFACE;

/// 32-bit Mach-O magic, as read big-endian from a little-endian image
pub const MH_CIGAM: u32 = 0xCEFAEDFE;

/// 64-bit Mach-O magic, as read big-endian from a big-endian image
pub const MH_MAGIC_64: u32 = 0xFEEDFACF;

/// 64-bit Mach-O magic, as read big-endian from a little-endian image
pub const MH_CIGAM_64: u32 = 0xCFFAEDFE;

/// Universal (fat) binary magic, always stored big-endian
pub const FAT_MAGIC: u32 = 0xCAFEBABE;

// =============================================================================
// File Types
// =============================================================================

/// Dynamically bound shared library
pub const MH_DYLIB: u32 = 0x6;

// =============================================================================
// CPU Types
// =============================================================================

/// 64-bit architecture flag
pub const CPU_ARCH_ABI64: u32 = 0x0100_0000;

/// ARM CPU type
pub const CPU_TYPE_ARM: u32 = 12;
/// ARM64 CPU type
pub const CPU_TYPE_ARM64: u32 = CPU_TYPE_ARM | CPU_ARCH_ABI64;

/// x86 CPU type
pub const CPU_TYPE_X86: u32 = 7;
/// x86_64 CPU type
pub const CPU_TYPE_X86_64: u32 = CPU_TYPE_X86 | CPU_ARCH_ABI64;

/// PowerPC CPU type
pub const CPU_TYPE_POWERPC: u32 = 18;

// =============================================================================
// CPU Subtypes
// =============================================================================

/// x86 all
pub const CPU_SUBTYPE_X86_ALL: u32 = 3;
/// ARMv6
pub const CPU_SUBTYPE_ARM_V6: u32 = 6;
/// ARMv7
pub const CPU_SUBTYPE_ARM_V7: u32 = 9;
/// ARMv7s
pub const CPU_SUBTYPE_ARM_V7S: u32 = 11;
/// ARMv7k
pub const CPU_SUBTYPE_ARM_V7K: u32 = 12;
/// ARM64 all
pub const CPU_SUBTYPE_ARM64_ALL: u32 = 0;
/// ARM64e (pointer authentication)
pub const CPU_SUBTYPE_ARM64E: u32 = 2;

// =============================================================================
// Load Commands
// =============================================================================

/// Load command requiring dynamic linker
pub const LC_REQ_DYLD: u32 = 0x8000_0000;

/// Link-edit symbol table info
pub const LC_SYMTAB: u32 = 0x2;
/// Load a dynamically linked shared library
pub const LC_LOAD_DYLIB: u32 = 0xC;
/// Dynamically linked shared lib identification
pub const LC_ID_DYLIB: u32 = 0xD;
/// UUID
pub const LC_UUID: u32 = 0x1B;
/// Load and re-export dylib
pub const LC_REEXPORT_DYLIB: u32 = 0x1F | LC_REQ_DYLD;

// =============================================================================
// Symbol Types
// =============================================================================

/// Mask for the type bits
pub const N_TYPE: u8 = 0x0E;
/// External symbol bit
pub const N_EXT: u8 = 0x01;

/// Undefined symbol
pub const N_UNDF: u8 = 0x0;
/// Defined in section number n_sect
pub const N_SECT: u8 = 0xE;

/// Weak definition (n_desc)
pub const N_WEAK_DEF: u16 = 0x0080;

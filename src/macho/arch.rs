//! Architecture identification from CPU type and subtype.

use std::fmt;

use super::constants::*;
use crate::error::{Error, Result};

/// Architectures a tbd stub can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
    /// 32-bit Intel
    I386,
    /// 64-bit Intel
    X86_64,
    /// ARMv6
    Armv6,
    /// ARMv7
    Armv7,
    /// ARMv7s
    Armv7s,
    /// 64-bit ARM (any subtype, including arm64e)
    Arm64,
}

impl Architecture {
    /// Maps a CPU type/subtype pair to an architecture.
    ///
    /// ARM slices are told apart by subtype alone; every other CPU type or
    /// ARM subtype is unsupported.
    pub fn from_cpu(cputype: u32, cpusubtype: u32) -> Option<Self> {
        match (cputype, cpusubtype) {
            (CPU_TYPE_X86, _) => Some(Architecture::I386),
            (CPU_TYPE_X86_64, _) => Some(Architecture::X86_64),
            (CPU_TYPE_ARM, CPU_SUBTYPE_ARM_V6) => Some(Architecture::Armv6),
            (CPU_TYPE_ARM, CPU_SUBTYPE_ARM_V7) => Some(Architecture::Armv7),
            (CPU_TYPE_ARM, CPU_SUBTYPE_ARM_V7S) => Some(Architecture::Armv7s),
            (CPU_TYPE_ARM64, _) => Some(Architecture::Arm64),
            _ => None,
        }
    }

    /// Like [`Architecture::from_cpu`], but reports unsupported pairs as an error.
    pub fn identify(cputype: u32, cpusubtype: u32) -> Result<Self> {
        Self::from_cpu(cputype, cpusubtype).ok_or(Error::UnsupportedArchitecture {
            cputype,
            cpusubtype,
        })
    }

    /// Returns the canonical architecture name.
    pub fn name(self) -> &'static str {
        match self {
            Architecture::I386 => "i386",
            Architecture::X86_64 => "x86_64",
            Architecture::Armv6 => "armv6",
            Architecture::Armv7 => "armv7",
            Architecture::Armv7s => "armv7s",
            Architecture::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

//! Mach-O context for reading a single-architecture image.

use tracing::debug;
use zerocopy::FromBytes;

use super::arch::Architecture;
use super::constants::*;
use super::container::{Bits, ContainerKind};
use super::structs::*;
use crate::error::{Error, Result};
use crate::util::{cstring, Endian, PackedVersion};

/// Every load command starts with its tag and size.
const LOAD_COMMAND_HEADER_SIZE: usize = 8;

// =============================================================================
// Load Command Info
// =============================================================================

/// Parsed load command information.
///
/// Only identification, re-export and symbol table commands are decoded;
/// everything else is kept as its tag and size.
#[derive(Debug, Clone)]
pub enum LoadCommandInfo {
    /// LC_ID_DYLIB
    DylibId {
        /// Install name
        name: String,
        /// Current version
        current_version: PackedVersion,
        /// Compatibility version
        compatibility_version: PackedVersion,
        /// Offset of the command within the image
        offset: usize,
    },
    /// LC_REEXPORT_DYLIB
    ReexportDylib {
        /// Path of the re-exported library
        name: String,
        /// Offset of the command within the image
        offset: usize,
    },
    /// LC_SYMTAB
    Symtab {
        /// The command, in host byte order
        command: SymtabCommand,
        /// Offset of the command within the image
        offset: usize,
    },
    /// Any other command
    Other {
        /// Command tag
        cmd: u32,
        /// Declared size
        cmdsize: u32,
        /// Offset of the command within the image
        offset: usize,
    },
}

impl LoadCommandInfo {
    /// Returns the load command offset.
    pub fn offset(&self) -> usize {
        match self {
            LoadCommandInfo::DylibId { offset, .. } => *offset,
            LoadCommandInfo::ReexportDylib { offset, .. } => *offset,
            LoadCommandInfo::Symtab { offset, .. } => *offset,
            LoadCommandInfo::Other { offset, .. } => *offset,
        }
    }
}

// =============================================================================
// Symbols
// =============================================================================

/// A symbol table entry with its name resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    /// Symbol name (empty for string index 0)
    pub name: String,
    /// Type flag
    pub n_type: u8,
    /// Section number
    pub n_sect: u8,
    /// Description flags
    pub n_desc: u16,
}

impl SymbolEntry {
    /// Returns true if this is an external symbol.
    #[inline]
    pub fn is_external(&self) -> bool {
        (self.n_type & N_EXT) != 0
    }

    /// Returns true if this symbol is defined in a section.
    #[inline]
    pub fn is_defined(&self) -> bool {
        (self.n_type & N_TYPE) == N_SECT
    }

    /// Returns true if this is an undefined symbol.
    #[inline]
    pub fn is_undefined(&self) -> bool {
        (self.n_type & N_TYPE) == N_UNDF
    }

    /// Returns true if the symbol carries the weak-definition flag.
    #[inline]
    pub fn is_weak_definition(&self) -> bool {
        (self.n_desc & N_WEAK_DEF) != 0
    }
}

// =============================================================================
// Mach-O Context
// =============================================================================

/// A single-architecture Mach-O image opened for reading.
///
/// The header is decoded and the load commands are walked on construction.
/// Malformed commands never fail construction; they are recorded in
/// `warnings` and skipped.
#[derive(Debug)]
pub struct MachOContext<'a> {
    /// The Mach-O header, in host byte order
    pub header: MachHeader,
    /// Word size
    pub bits: Bits,
    /// Byte order
    pub endian: Endian,
    /// Parsed load commands
    pub load_commands: Vec<LoadCommandInfo>,
    /// Recoverable problems found while walking load commands
    pub warnings: Vec<Error>,
    data: &'a [u8],
}

impl<'a> MachOContext<'a> {
    /// Opens a thin image.
    ///
    /// Fails with `MalformedInput` if the data does not start with a thin
    /// Mach-O magic or is too short to hold a header.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let (bits, endian) = match ContainerKind::detect(data) {
            ContainerKind::Thin { bits, endian } => (bits, endian),
            ContainerKind::Fat => {
                return Err(Error::malformed("universal binary nested inside a slice"))
            }
            ContainerKind::Unrecognized(magic) => {
                return Err(Error::malformed(format!("bad magic {magic:#010x}")))
            }
        };

        if data.len() < bits.header_size() {
            return Err(Error::malformed(format!(
                "{}-bit header needs {} bytes, file has {}",
                bits,
                bits.header_size(),
                data.len()
            )));
        }

        let header = MachHeader::read_from_prefix(data)
            .map_err(|_| Error::malformed("failed to read Mach-O header"))?
            .0
            .to_host(endian);
        debug!("{} {}", endian, header);

        let mut ctx = Self {
            header,
            bits,
            endian,
            load_commands: Vec::new(),
            warnings: Vec::new(),
            data,
        };

        ctx.walk_load_commands();

        Ok(ctx)
    }

    /// Walks the load commands using each command's declared size.
    ///
    /// A command whose size is below the 8-byte header or beyond the
    /// load-command area ends the walk, since the next command cannot be
    /// located.
    fn walk_load_commands(&mut self) {
        let data = self.data;
        let header_size = self.bits.header_size();
        let end = header_size
            .saturating_add(self.header.sizeofcmds as usize)
            .min(data.len());

        let mut offset = header_size;
        for index in 0..self.header.ncmds {
            let available = end.saturating_sub(offset);
            if available < LOAD_COMMAND_HEADER_SIZE {
                self.warnings.push(Error::TruncatedCommand {
                    index,
                    offset,
                    cmdsize: 0,
                    available,
                });
                break;
            }

            let (Some(cmd), Some(raw_cmdsize)) = (
                self.endian.read_u32_at(data, offset),
                self.endian.read_u32_at(data, offset + 4),
            ) else {
                break;
            };
            let cmdsize = raw_cmdsize as usize;

            if cmdsize < LOAD_COMMAND_HEADER_SIZE || cmdsize > available {
                self.warnings.push(Error::TruncatedCommand {
                    index,
                    offset,
                    cmdsize: raw_cmdsize,
                    available,
                });
                break;
            }

            let cmd_data = &data[offset..offset + cmdsize];
            match self.parse_load_command(index, cmd, cmd_data, offset) {
                Ok(info) => self.load_commands.push(info),
                Err(e) => {
                    debug!("skipping load command {} ({:#x}): {}", index, cmd, e);
                    self.warnings.push(e);
                }
            }

            offset += cmdsize;
        }
    }

    /// Parses a single load command.
    fn parse_load_command(
        &self,
        index: u32,
        cmd: u32,
        data: &[u8],
        offset: usize,
    ) -> Result<LoadCommandInfo> {
        let truncated = || Error::TruncatedCommand {
            index,
            offset,
            cmdsize: data.len() as u32,
            available: data.len(),
        };

        match cmd {
            LC_ID_DYLIB | LC_REEXPORT_DYLIB => {
                let dylib = DylibCommand::read_from_prefix(data)
                    .map_err(|_| truncated())?
                    .0
                    .to_host(self.endian);

                // An offset at the very end of the command names the empty string.
                let name_offset = dylib.name_offset as usize;
                let name = data.get(name_offset..).map(cstring).ok_or_else(truncated)?;

                if cmd == LC_ID_DYLIB {
                    Ok(LoadCommandInfo::DylibId {
                        name,
                        current_version: PackedVersion(dylib.current_version),
                        compatibility_version: PackedVersion(dylib.compatibility_version),
                        offset,
                    })
                } else {
                    Ok(LoadCommandInfo::ReexportDylib { name, offset })
                }
            }

            LC_SYMTAB => {
                let symtab = SymtabCommand::read_from_prefix(data)
                    .map_err(|_| truncated())?
                    .0
                    .to_host(self.endian);

                Ok(LoadCommandInfo::Symtab {
                    command: symtab,
                    offset,
                })
            }

            _ => Ok(LoadCommandInfo::Other {
                cmd,
                cmdsize: data.len() as u32,
                offset,
            }),
        }
    }

    /// Identifies the architecture of this image.
    pub fn architecture(&self) -> Result<Architecture> {
        Architecture::identify(self.header.cputype, self.header.cpusubtype)
    }

    /// Returns the last identification command, if any.
    pub fn dylib_id(&self) -> Option<(&str, PackedVersion, PackedVersion)> {
        self.load_commands.iter().rev().find_map(|lc| {
            if let LoadCommandInfo::DylibId {
                name,
                current_version,
                compatibility_version,
                ..
            } = lc
            {
                Some((name.as_str(), *current_version, *compatibility_version))
            } else {
                None
            }
        })
    }

    /// Returns re-exported library paths in command order, duplicates included.
    pub fn reexports(&self) -> impl Iterator<Item = &str> {
        self.load_commands.iter().filter_map(|lc| {
            if let LoadCommandInfo::ReexportDylib { name, .. } = lc {
                Some(name.as_str())
            } else {
                None
            }
        })
    }

    /// Returns the last symbol table command.
    pub fn symtab(&self) -> Option<&SymtabCommand> {
        self.load_commands.iter().rev().find_map(|lc| {
            if let LoadCommandInfo::Symtab { command, .. } = lc {
                Some(command)
            } else {
                None
            }
        })
    }

    /// Reads the symbol table.
    ///
    /// An image without LC_SYMTAB has no symbols. A table or string index
    /// that points outside the image is an error for the whole image.
    pub fn symbols(&self) -> Result<Vec<SymbolEntry>> {
        let Some(symtab) = self.symtab() else {
            return Ok(Vec::new());
        };

        let nlist_size = self.bits.nlist_size();
        let symoff = symtab.symoff as u64;
        let symsize = symtab.nsyms as u64 * nlist_size as u64;
        let table = self
            .slice(symoff, symsize)
            .ok_or(Error::SymbolTableOverflow {
                offset: symoff,
                size: symsize,
                available: self.data.len(),
            })?;

        let stroff = symtab.stroff as u64;
        let strsize = symtab.strsize as u64;
        let strings = self
            .slice(stroff, strsize)
            .ok_or(Error::StringTableOverflow {
                offset: stroff,
                size: strsize,
            })?;

        let mut symbols = Vec::with_capacity(symtab.nsyms as usize);
        for entry in table.chunks_exact(nlist_size) {
            let (n_strx, n_type, n_sect, n_desc) = self.read_nlist(entry)?;

            let strx = n_strx as usize;
            if strx >= strings.len() && strx != 0 {
                return Err(Error::StringTableOverflow {
                    offset: n_strx as u64,
                    size: strsize,
                });
            }
            let name = strings.get(strx..).map(cstring).unwrap_or_default();

            symbols.push(SymbolEntry {
                name,
                n_type,
                n_sect,
                n_desc,
            });
        }

        Ok(symbols)
    }

    /// Decodes one nlist entry into (n_strx, n_type, n_sect, n_desc).
    fn read_nlist(&self, entry: &[u8]) -> Result<(u32, u8, u8, u16)> {
        let too_small = || Error::buffer_too_small(self.bits.nlist_size(), entry.len());
        match self.bits {
            Bits::B32 => {
                let nlist = Nlist::read_from_prefix(entry).map_err(|_| too_small())?.0;
                Ok((
                    self.endian.u32(nlist.n_strx),
                    nlist.n_type,
                    nlist.n_sect,
                    self.endian.u16(nlist.n_desc),
                ))
            }
            Bits::B64 => {
                let nlist = Nlist64::read_from_prefix(entry).map_err(|_| too_small())?.0;
                Ok((
                    self.endian.u32(nlist.n_strx),
                    nlist.n_type,
                    nlist.n_sect,
                    self.endian.u16(nlist.n_desc),
                ))
            }
        }
    }

    /// Returns `len` bytes at `offset`, or `None` if out of bounds.
    fn slice(&self, offset: u64, len: u64) -> Option<&'a [u8]> {
        let end = offset.checked_add(len)?;
        if end > self.data.len() as u64 {
            return None;
        }
        self.data.get(offset as usize..end as usize)
    }
}

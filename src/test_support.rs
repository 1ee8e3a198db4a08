//! Fixture builders for Mach-O images used by unit tests.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::macho::*;
use crate::util::Endian;

fn put_u32(out: &mut Vec<u8>, endian: Endian, value: u32) {
    let mut buf = [0u8; 4];
    match endian {
        Endian::Little => LittleEndian::write_u32(&mut buf, value),
        Endian::Big => BigEndian::write_u32(&mut buf, value),
    }
    out.extend_from_slice(&buf);
}

fn put_u16(out: &mut Vec<u8>, endian: Endian, value: u16) {
    let mut buf = [0u8; 2];
    match endian {
        Endian::Little => LittleEndian::write_u16(&mut buf, value),
        Endian::Big => BigEndian::write_u16(&mut buf, value),
    }
    out.extend_from_slice(&buf);
}

/// Builds a thin Mach-O dylib image in memory.
#[derive(Debug, Clone)]
pub(crate) struct ImageBuilder {
    endian: Endian,
    bits: Bits,
    cputype: u32,
    cpusubtype: u32,
    commands: Vec<Vec<u8>>,
    /// Name, n_type, n_desc and an n_strx that overrides the real one.
    symbols: Vec<(String, u8, u16, Option<u32>)>,
    extra_ncmds: u32,
}

impl ImageBuilder {
    /// A little-endian 64-bit image.
    pub fn new(cputype: u32, cpusubtype: u32) -> Self {
        Self {
            endian: Endian::Little,
            bits: Bits::B64,
            cputype,
            cpusubtype,
            commands: Vec::new(),
            symbols: Vec::new(),
            extra_ncmds: 0,
        }
    }

    pub fn arm64() -> Self {
        Self::new(CPU_TYPE_ARM64, CPU_SUBTYPE_ARM64_ALL)
    }

    pub fn x86_64() -> Self {
        Self::new(CPU_TYPE_X86_64, CPU_SUBTYPE_X86_ALL)
    }

    pub fn armv7() -> Self {
        Self::new(CPU_TYPE_ARM, CPU_SUBTYPE_ARM_V7).bits32()
    }

    pub fn big_endian(mut self) -> Self {
        self.endian = Endian::Big;
        self
    }

    pub fn bits32(mut self) -> Self {
        self.bits = Bits::B32;
        self
    }

    fn dylib_command(&self, cmd: u32, name: &str, current: u32, compat: u32) -> Vec<u8> {
        let align = match self.bits {
            Bits::B32 => 4,
            Bits::B64 => 8,
        };
        let unpadded = DylibCommand::SIZE + name.len() + 1;
        let cmdsize = unpadded.div_ceil(align) * align;

        let mut out = Vec::with_capacity(cmdsize);
        put_u32(&mut out, self.endian, cmd);
        put_u32(&mut out, self.endian, cmdsize as u32);
        put_u32(&mut out, self.endian, DylibCommand::SIZE as u32);
        put_u32(&mut out, self.endian, 2);
        put_u32(&mut out, self.endian, current);
        put_u32(&mut out, self.endian, compat);
        out.extend_from_slice(name.as_bytes());
        out.resize(cmdsize, 0);
        out
    }

    /// Adds an LC_ID_DYLIB command.
    pub fn id_dylib(mut self, name: &str, current: u32, compat: u32) -> Self {
        let cmd = self.dylib_command(LC_ID_DYLIB, name, current, compat);
        self.commands.push(cmd);
        self
    }

    /// Adds an LC_REEXPORT_DYLIB command.
    pub fn reexport(mut self, name: &str) -> Self {
        let cmd = self.dylib_command(LC_REEXPORT_DYLIB, name, 0x0001_0000, 0x0001_0000);
        self.commands.push(cmd);
        self
    }

    /// Adds an LC_LOAD_DYLIB command (which the walker ignores).
    pub fn load_dylib(mut self, name: &str) -> Self {
        let cmd = self.dylib_command(LC_LOAD_DYLIB, name, 0x0001_0000, 0x0001_0000);
        self.commands.push(cmd);
        self
    }

    /// Adds a command with the given tag, declared size and payload.
    ///
    /// The payload is written after the 8-byte header as-is, so the declared
    /// size may disagree with the bytes actually present.
    pub fn raw_command(mut self, cmd: u32, cmdsize: u32, payload: &[u8]) -> Self {
        let mut out = Vec::new();
        put_u32(&mut out, self.endian, cmd);
        put_u32(&mut out, self.endian, cmdsize);
        out.extend_from_slice(payload);
        self.commands.push(out);
        self
    }

    /// Claims more commands in the header than are actually present.
    pub fn extra_ncmds(mut self, extra: u32) -> Self {
        self.extra_ncmds = extra;
        self
    }

    /// Adds a symbol with the given n_type.
    pub fn symbol(mut self, name: &str, n_type: u8) -> Self {
        self.symbols.push((name.to_string(), n_type, 0, None));
        self
    }

    /// Adds a symbol with the given n_type and n_desc.
    pub fn symbol_with_desc(mut self, name: &str, n_type: u8, n_desc: u16) -> Self {
        self.symbols.push((name.to_string(), n_type, n_desc, None));
        self
    }

    /// Adds an exported symbol whose n_strx is `strx` verbatim.
    pub fn export_at_strx(mut self, strx: u32) -> Self {
        self.symbols.push((String::new(), N_SECT | N_EXT, 0, Some(strx)));
        self
    }

    /// Adds an exported (defined, external) symbol.
    pub fn export(self, name: &str) -> Self {
        self.symbol(name, N_SECT | N_EXT)
    }

    pub fn build(&self) -> Vec<u8> {
        let e = self.endian;
        let header_size = self.bits.header_size();
        let has_symtab = !self.symbols.is_empty();

        let mut commands: Vec<u8> = self.commands.concat();
        let mut ncmds = self.commands.len() as u32;
        let symtab_offset = commands.len();
        if has_symtab {
            commands.resize(symtab_offset + SymtabCommand::SIZE, 0);
            ncmds += 1;
        }

        let symoff = header_size + commands.len();
        let nlist_size = self.bits.nlist_size();
        let stroff = symoff + self.symbols.len() * nlist_size;

        let mut strtab = vec![0u8];
        let mut nlists = Vec::new();
        for (name, n_type, n_desc, forced_strx) in &self.symbols {
            let strx = if let Some(strx) = forced_strx {
                *strx as usize
            } else if name.is_empty() {
                0
            } else {
                let strx = strtab.len();
                strtab.extend_from_slice(name.as_bytes());
                strtab.push(0);
                strx
            };
            put_u32(&mut nlists, e, strx as u32);
            nlists.push(*n_type);
            nlists.push(1);
            put_u16(&mut nlists, e, *n_desc);
            match self.bits {
                Bits::B32 => put_u32(&mut nlists, e, 0x1000),
                Bits::B64 => {
                    put_u32(&mut nlists, e, 0x1000);
                    put_u32(&mut nlists, e, 0);
                }
            }
        }

        if has_symtab {
            let mut cmd = Vec::new();
            put_u32(&mut cmd, e, LC_SYMTAB);
            put_u32(&mut cmd, e, SymtabCommand::SIZE as u32);
            put_u32(&mut cmd, e, symoff as u32);
            put_u32(&mut cmd, e, self.symbols.len() as u32);
            put_u32(&mut cmd, e, stroff as u32);
            put_u32(&mut cmd, e, strtab.len() as u32);
            commands[symtab_offset..symtab_offset + SymtabCommand::SIZE].copy_from_slice(&cmd);
        }

        let magic = match self.bits {
            Bits::B32 => MH_MAGIC,
            Bits::B64 => MH_MAGIC_64,
        };

        let mut out = Vec::new();
        put_u32(&mut out, e, magic);
        put_u32(&mut out, e, self.cputype);
        put_u32(&mut out, e, self.cpusubtype);
        put_u32(&mut out, e, MH_DYLIB);
        put_u32(&mut out, e, ncmds + self.extra_ncmds);
        put_u32(&mut out, e, commands.len() as u32);
        put_u32(&mut out, e, 0);
        if self.bits == Bits::B64 {
            put_u32(&mut out, e, 0);
        }
        out.extend_from_slice(&commands);
        out.extend_from_slice(&nlists);
        out.extend_from_slice(&strtab);
        out
    }
}

/// Wraps thin images into a universal binary, in the given order.
pub(crate) fn fat_binary(slices: &[(u32, u32, Vec<u8>)]) -> Vec<u8> {
    const ALIGN: usize = 0x1000;

    let mut out = Vec::new();
    put_u32(&mut out, Endian::Big, FAT_MAGIC);
    put_u32(&mut out, Endian::Big, slices.len() as u32);

    let mut offset = FatHeader::SIZE + slices.len() * FatArch::SIZE;
    let mut offsets = Vec::new();
    for (cputype, cpusubtype, image) in slices {
        offset = offset.div_ceil(ALIGN) * ALIGN;
        put_u32(&mut out, Endian::Big, *cputype);
        put_u32(&mut out, Endian::Big, *cpusubtype);
        put_u32(&mut out, Endian::Big, offset as u32);
        put_u32(&mut out, Endian::Big, image.len() as u32);
        put_u32(&mut out, Endian::Big, 12);
        offsets.push(offset);
        offset += image.len();
    }

    for ((_, _, image), offset) in slices.iter().zip(offsets) {
        out.resize(offset, 0);
        out.extend_from_slice(image);
    }
    out
}

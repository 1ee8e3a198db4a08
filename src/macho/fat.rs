//! Universal (fat) binary handling.

use tracing::debug;
use zerocopy::FromBytes;

use super::constants::*;
use super::structs::*;
use crate::error::{Error, Result};

/// One architecture slice of a universal binary.
#[derive(Debug, Clone)]
pub struct FatSlice {
    /// Position of the slice in the universal header
    pub index: usize,
    /// CPU type declared by the universal header
    pub cputype: u32,
    /// CPU subtype declared by the universal header
    pub cpusubtype: u32,
    /// File offset of the slice
    pub offset: u64,
    /// Size of the slice
    pub size: u64,
}

/// A universal binary opened for reading.
#[derive(Debug)]
pub struct FatContext<'a> {
    /// Slices in on-disk header order
    pub slices: Vec<FatSlice>,
    data: &'a [u8],
}

impl<'a> FatContext<'a> {
    /// Parses the universal header and its architecture table.
    ///
    /// Fails with `MalformedInput` if the magic is wrong, the binary holds
    /// no slices, or the architecture table runs past the end of the file.
    /// Slice bounds are only checked when a slice is read.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let header = FatHeader::read_from_prefix(data)
            .map_err(|_| Error::malformed("universal header truncated"))?
            .0;

        if header.magic.get() != FAT_MAGIC {
            return Err(Error::malformed(format!(
                "bad universal magic {:#010x}",
                header.magic.get()
            )));
        }

        let nfat = header.nfat_arch.get() as usize;
        if nfat == 0 {
            return Err(Error::malformed("universal binary contains no images"));
        }

        let table_size = nfat
            .checked_mul(FatArch::SIZE)
            .ok_or_else(|| Error::malformed("universal architecture count overflows"))?;
        let table = data
            .get(FatHeader::SIZE..FatHeader::SIZE.saturating_add(table_size))
            .ok_or_else(|| {
                Error::malformed(format!(
                    "no room for {} universal architecture entries",
                    nfat
                ))
            })?;

        let mut slices = Vec::with_capacity(nfat);
        for (index, entry) in table.chunks_exact(FatArch::SIZE).enumerate() {
            let arch = FatArch::read_from_bytes(entry)
                .map_err(|_| Error::malformed("universal architecture entry truncated"))?;
            debug!("slice {}: {}", index, arch);
            slices.push(FatSlice {
                index,
                cputype: arch.cputype.get(),
                cpusubtype: arch.cpusubtype.get(),
                offset: arch.offset.get() as u64,
                size: arch.size.get() as u64,
            });
        }

        Ok(Self { slices, data })
    }

    /// Returns the bytes of a slice.
    pub fn slice_data(&self, slice: &FatSlice) -> Result<&'a [u8]> {
        let out_of_bounds = || Error::SliceOutOfBounds {
            index: slice.index,
            offset: slice.offset,
            size: slice.size,
            file_size: self.data.len() as u64,
        };

        let end = slice.offset.checked_add(slice.size).ok_or_else(out_of_bounds)?;
        if end > self.data.len() as u64 {
            return Err(out_of_bounds());
        }
        Ok(&self.data[slice.offset as usize..end as usize])
    }

    /// Iterates over slices together with their bytes, in header order.
    pub fn iter_slices(&self) -> impl Iterator<Item = (&FatSlice, Result<&'a [u8]>)> + '_ {
        self.slices
            .iter()
            .map(move |slice| (slice, self.slice_data(slice)))
    }
}

//! Finding sections by name.
//!
//! Names live in the section header string table, the section at `e_shstrndx`. The locator
//! loads that table once and then walks the section header table entry by entry, reading each
//! header from the file as it goes. A file whose `e_shstrndx` is `SHN_UNDEF` has no names, so no
//! section can be found in it by name.

use std::io::{Read, Seek, SeekFrom};

use log::{debug, trace};
use scroll::{Endian, Pread};

use crate::elf::header::Header;
use crate::elf::section_header::{SHN_UNDEF, SHN_XINDEX, SIZEOF_SHDR, SectionHeader, sht_to_str};
use crate::elf::{read_at, read_section, stream_len};
use crate::error;
use crate::options::{ParseOptions, Permissive};
use crate::strtab::Strtab;

/// Looks up section headers by name in one file.
///
/// The locator borrows the reader for its whole life. It leaves the reader positioned at the
/// start of the file after every lookup.
pub struct SectionLocator<'a, R> {
    fd: &'a mut R,
    size: u64,
    shoff: u64,
    shentsize: u64,
    shnum: usize,
    endian: Endian,
    shstrtab: Option<Vec<u8>>,
    options: ParseOptions,
}

impl<'a, R: Read + Seek> SectionLocator<'a, R> {
    /// Prepares a locator for the file `header` was read from, loading the section header
    /// string table.
    pub fn new(header: &Header, fd: &'a mut R, options: ParseOptions) -> error::Result<Self> {
        let endian = header.endianness()?;
        let size = stream_len(fd)?;
        let mut locator = SectionLocator {
            fd,
            size,
            shoff: header.e_shoff,
            shentsize: u64::from(header.e_shentsize),
            shnum: 0,
            endian,
            shstrtab: None,
            options,
        };
        if header.e_shoff == 0 {
            debug!("no section header table");
            return Ok(locator);
        }
        if locator.shentsize < SIZEOF_SHDR as u64 {
            return Err(error::Error::Malformed(format!(
                "e_shentsize {} is smaller than a section header ({})",
                header.e_shentsize, SIZEOF_SHDR
            )));
        }

        // Extended numbering: with too many sections for the header fields, the real count
        // lives in the first section's sh_size and the real index in its sh_link.
        let mut shnum = usize::from(header.e_shnum);
        let mut shstrndx = usize::from(header.e_shstrndx);
        if header.e_shnum == 0 || header.e_shstrndx == SHN_XINDEX {
            let first = locator.read_shdr(0)?;
            if header.e_shnum == 0 {
                shnum = usize::try_from(first.sh_size).map_err(|_| {
                    error::Error::Malformed(format!("section count {:#x} is too large", first.sh_size))
                })?;
            }
            if header.e_shstrndx == SHN_XINDEX {
                shstrndx = first.sh_link as usize;
            }
            debug!("extended section numbering: {} sections, names in {}", shnum, shstrndx);
        }
        locator.shnum = shnum;
        if shnum == 0 {
            return Ok(locator);
        }

        let table_end = (shnum as u64)
            .checked_mul(locator.shentsize)
            .and_then(|size| size.checked_add(locator.shoff))
            .ok_or_else(|| {
                error::Error::Malformed(format!("section header table of {} entries overflows", shnum))
            })?;
        if table_end > locator.size {
            return Err(error::Error::Malformed(format!(
                "section header table ({:#x}, {} entries) extends past the end of the file",
                locator.shoff, shnum
            )));
        }
        if shstrndx >= shnum {
            return Err(error::Error::Malformed(format!(
                "section name string table index {} is out of bounds ({} sections)",
                shstrndx, shnum
            )));
        }

        if shstrndx == usize::from(SHN_UNDEF) {
            debug!("no section name string table");
        } else {
            let shstrtab_shdr = locator.read_shdr(shstrndx)?;
            trace!("section name string table: {:?}", shstrtab_shdr);
            locator.shstrtab =
                Some(locator.read_section(&shstrtab_shdr, "section name string table")?);
        }
        locator.fd.seek(SeekFrom::Start(0))?;
        Ok(locator)
    }

    /// The number of section headers in the file
    pub fn len(&self) -> usize {
        self.shnum
    }

    /// Whether the file has no section headers at all
    pub fn is_empty(&self) -> bool {
        self.shnum == 0
    }

    /// Reads the section header at `index`
    pub fn section(&mut self, index: usize) -> error::Result<SectionHeader> {
        if index >= self.shnum {
            return Err(error::Error::Malformed(format!(
                "section index {} is out of bounds ({} sections)",
                index, self.shnum
            )));
        }
        self.read_shdr(index)
    }

    /// Reads the contents of `shdr` from this file, leaving the reader wherever the read ended.
    pub(crate) fn read_section(
        &mut self,
        shdr: &SectionHeader,
        what: &str,
    ) -> error::Result<Vec<u8>> {
        read_section(self.fd, self.size, shdr, what, self.options.is_permissive())
    }

    /// Finds the first section called exactly `name`.
    ///
    /// Returns [`error::Error::MissingSection`] if no section has that name.
    pub fn locate(&mut self, name: &str) -> error::Result<SectionHeader> {
        let found = self.scan(name.as_bytes());
        self.fd.seek(SeekFrom::Start(0))?;
        match found? {
            Some((index, shdr)) => {
                debug!(
                    "{} is section {}: {} at {:#x}, {:#x} bytes",
                    name,
                    index,
                    sht_to_str(shdr.sh_type),
                    shdr.sh_offset,
                    shdr.sh_size
                );
                Ok(shdr)
            }
            None => Err(error::Error::MissingSection(name.to_owned())),
        }
    }

    fn scan(&mut self, name: &[u8]) -> error::Result<Option<(usize, SectionHeader)>> {
        let permissive = self.options.is_permissive();
        if self.shstrtab.is_none() {
            return Ok(None);
        }
        for index in 0..self.shnum {
            let shdr = self.read_shdr(index)?;
            let names = Strtab::new(self.shstrtab.as_deref().unwrap_or_default(), 0x0);
            let matched = names
                .matches(shdr.sh_name as usize, name)
                .ok_or_else(|| {
                    error::Error::Malformed(format!(
                        "section {} name offset {:#x} is outside the section name string table ({:#x} bytes)",
                        index,
                        shdr.sh_name,
                        names.len()
                    ))
                })
                .or_permissive_and_default(permissive, "skipping section")?;
            if matched {
                return Ok(Some((index, shdr)));
            }
        }
        Ok(None)
    }

    fn read_shdr(&mut self, index: usize) -> error::Result<SectionHeader> {
        let offset = (index as u64)
            .checked_mul(self.shentsize)
            .and_then(|offset| offset.checked_add(self.shoff))
            .ok_or_else(|| {
                error::Error::Malformed(format!("section header {} offset overflows", index))
            })?;
        let bytes = read_at(self.fd, self.size, offset, SIZEOF_SHDR, "section header")?;
        let shdr: SectionHeader = bytes.pread_with(0, self.endian)?;
        Ok(shdr)
    }
}

/// Finds the first section called exactly `name` in the file `header` was read from.
///
/// Each call reloads the section name string table; use a [`SectionLocator`] to look up several
/// sections of the same file.
pub fn locate<R: Read + Seek>(
    header: &Header,
    fd: &mut R,
    name: &str,
) -> error::Result<SectionHeader> {
    SectionLocator::new(header, fd, ParseOptions::default())?.locate(name)
}

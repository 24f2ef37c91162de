use core::fmt;
use std::io::{Read, Seek};

use scroll::{Endian, Pread, Pwrite, SizeWith};

use crate::error;

/// The ELF magic number.
pub const ELFMAG: &[u8; 4] = b"\x7FELF";
/// Length of the ELF magic number.
pub const SELFMAG: usize = 4;
/// Number of bytes in an identifier.
pub const SIZEOF_IDENT: usize = 16;
/// Size of a 64-bit ELF header.
pub const SIZEOF_EHDR: usize = 64;

/// File class byte index.
pub const EI_CLASS: usize = 4;
/// Invalid class.
pub const ELFCLASSNONE: u8 = 0;
/// 32-bit objects.
pub const ELFCLASS32: u8 = 1;
/// 64-bit objects.
pub const ELFCLASS64: u8 = 2;

/// Data encoding byte index.
pub const EI_DATA: usize = 5;
/// Invalid data encoding.
pub const ELFDATANONE: u8 = 0;
/// 2's complement, little endian.
pub const ELFDATA2LSB: u8 = 1;
/// 2's complement, big endian.
pub const ELFDATA2MSB: u8 = 2;

/// No file type.
pub const ET_NONE: u16 = 0;
/// Relocatable file.
pub const ET_REL: u16 = 1;
/// Executable file.
pub const ET_EXEC: u16 = 2;
/// Shared object file.
pub const ET_DYN: u16 = 3;
/// Core file.
pub const ET_CORE: u16 = 4;

/// Convert a ELF class byte to the associated string.
#[inline]
pub fn class_to_str(class: u8) -> &'static str {
    match class {
        ELFCLASSNONE => "NONE",
        ELFCLASS32 => "ELF32",
        ELFCLASS64 => "ELF64",
        _ => "UNKNOWN_CLASS",
    }
}

/// Convert an ET value to their associated string.
#[inline]
pub fn et_to_str(et: u16) -> &'static str {
    match et {
        ET_NONE => "NONE",
        ET_REL => "REL",
        ET_EXEC => "EXEC",
        ET_DYN => "DYN",
        ET_CORE => "CORE",
        _ => "UNKNOWN_ET",
    }
}

/// The 64-bit ELF file header
#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Pread, Pwrite, SizeWith)]
pub struct Header {
    /// Magic number and other info
    pub e_ident: [u8; 16],
    /// Object file type
    pub e_type: u16,
    /// Architecture
    pub e_machine: u16,
    /// Object file version
    pub e_version: u32,
    /// Entry point virtual address
    pub e_entry: u64,
    /// Program header table file offset
    pub e_phoff: u64,
    /// Section header table file offset
    pub e_shoff: u64,
    /// Processor-specific flags
    pub e_flags: u32,
    /// ELF header size in bytes
    pub e_ehsize: u16,
    /// Program header table entry size
    pub e_phentsize: u16,
    /// Program header table entry count
    pub e_phnum: u16,
    /// Section header table entry size
    pub e_shentsize: u16,
    /// Section header table entry count
    pub e_shnum: u16,
    /// Section header string table index
    pub e_shstrndx: u16,
}

impl Header {
    /// Whether the file is an `ET_EXEC` executable
    pub fn is_executable(&self) -> bool {
        self.e_type == ET_EXEC
    }

    /// The byte order of everything after the identification bytes
    pub fn endianness(&self) -> error::Result<Endian> {
        match self.e_ident[EI_DATA] {
            ELFDATA2LSB => Ok(Endian::Little),
            ELFDATA2MSB => Ok(Endian::Big),
            d => Err(error::Error::Malformed(format!("invalid ELF data encoding {:#x}", d))),
        }
    }

    /// Parses the ELF header from the start of `bytes`, validating the magic, the class and the
    /// data encoding before decoding the rest with the file's byte order.
    pub fn parse(bytes: &[u8]) -> error::Result<Header> {
        if bytes.len() < SELFMAG || &bytes[..SELFMAG] != ELFMAG {
            let mut magic = [0u8; 8];
            let n = bytes.len().min(magic.len());
            magic[..n].copy_from_slice(&bytes[..n]);
            return Err(error::Error::BadMagic(u64::from_le_bytes(magic)));
        }
        if bytes.len() < SIZEOF_EHDR {
            return Err(error::Error::Malformed(format!(
                "{} bytes is smaller than an ELF header",
                bytes.len()
            )));
        }
        let class = bytes[EI_CLASS];
        if class != ELFCLASS64 {
            return Err(error::Error::Malformed(format!(
                "unsupported ELF class {} ({:#x})",
                class_to_str(class),
                class
            )));
        }
        let endian = match bytes[EI_DATA] {
            ELFDATA2LSB => Endian::Little,
            ELFDATA2MSB => Endian::Big,
            d => {
                return Err(error::Error::Malformed(format!(
                    "invalid ELF data encoding {:#x}",
                    d
                )));
            }
        };
        let header: Header = bytes.pread_with(0, endian)?;
        Ok(header)
    }

    /// Reads and parses the header at the very start of `fd`.
    pub fn from_fd<R: Read + Seek>(fd: &mut R) -> error::Result<Header> {
        let size = super::stream_len(fd)?;
        let len = size.min(SIZEOF_EHDR as u64) as usize;
        let bytes = super::read_at(fd, size, 0, len, "ELF header")?;
        Header::parse(&bytes)
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Header")
            .field("e_ident", &format_args!("{:?}", self.e_ident))
            .field("e_type", &et_to_str(self.e_type))
            .field("e_machine", &format_args!("0x{:x}", self.e_machine))
            .field("e_version", &format_args!("0x{:x}", self.e_version))
            .field("e_entry", &format_args!("0x{:x}", self.e_entry))
            .field("e_phoff", &format_args!("0x{:x}", self.e_phoff))
            .field("e_shoff", &format_args!("0x{:x}", self.e_shoff))
            .field("e_flags", &format_args!("{:x}", self.e_flags))
            .field("e_ehsize", &self.e_ehsize)
            .field("e_phentsize", &self.e_phentsize)
            .field("e_phnum", &self.e_phnum)
            .field("e_shentsize", &self.e_shentsize)
            .field("e_shnum", &self.e_shnum)
            .field("e_shstrndx", &self.e_shstrndx)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header_bytes(class: u8, data: u8, e_type: u16) -> Vec<u8> {
        let endian = if data == ELFDATA2MSB {
            Endian::Big
        } else {
            Endian::Little
        };
        let mut e_ident = [0u8; SIZEOF_IDENT];
        e_ident[..SELFMAG].copy_from_slice(ELFMAG);
        e_ident[EI_CLASS] = class;
        e_ident[EI_DATA] = data;
        let header = Header {
            e_ident,
            e_type,
            e_machine: 0x3e,
            e_version: 1,
            e_entry: 0x401020,
            e_shoff: 0x3a00,
            e_ehsize: SIZEOF_EHDR as u16,
            e_shentsize: 64,
            e_shnum: 29,
            e_shstrndx: 28,
            ..Default::default()
        };
        let mut bytes = vec![0u8; SIZEOF_EHDR];
        bytes.pwrite_with(header, 0, endian).unwrap();
        bytes
    }

    #[test]
    fn parse_little_endian_executable() {
        let bytes = header_bytes(ELFCLASS64, ELFDATA2LSB, ET_EXEC);
        let header = Header::parse(&bytes).unwrap();
        assert!(header.is_executable());
        assert_eq!(header.e_machine, 0x3e);
        assert_eq!(header.e_entry, 0x401020);
        assert_eq!(header.e_shoff, 0x3a00);
        assert_eq!(header.e_shnum, 29);
        assert_eq!(header.e_shstrndx, 28);
        assert_eq!(header.endianness().unwrap(), Endian::Little);
    }

    #[test]
    fn parse_big_endian_shared_object() {
        let bytes = header_bytes(ELFCLASS64, ELFDATA2MSB, ET_DYN);
        let header = Header::parse(&bytes).unwrap();
        assert!(!header.is_executable());
        assert_eq!(header.e_type, ET_DYN);
        assert_eq!(header.e_shnum, 29);
        assert_eq!(header.endianness().unwrap(), Endian::Big);
    }

    #[test]
    fn rejects_elf32_and_bad_encoding() {
        let bytes = header_bytes(ELFCLASS32, ELFDATA2LSB, ET_EXEC);
        assert!(matches!(Header::parse(&bytes), Err(error::Error::Malformed(_))));
        let mut bytes = header_bytes(ELFCLASS64, ELFDATA2LSB, ET_EXEC);
        bytes[EI_DATA] = 7;
        assert!(matches!(Header::parse(&bytes), Err(error::Error::Malformed(_))));
    }

    #[test]
    fn bad_magic() {
        match Header::parse(b"#!/bin/sh\necho hi\n") {
            Err(error::Error::BadMagic(magic)) => {
                assert_eq!(magic, u64::from_le_bytes(*b"#!/bin/s"))
            }
            other => panic!("expected bad magic, got {:?}", other.map(|_| ())),
        }
        assert!(matches!(Header::parse(b""), Err(error::Error::BadMagic(0))));
    }

    #[test]
    fn truncated_header() {
        let bytes = header_bytes(ELFCLASS64, ELFDATA2LSB, ET_EXEC);
        assert!(matches!(
            Header::parse(&bytes[..40]),
            Err(error::Error::Malformed(_))
        ));
        let mut fd = Cursor::new(bytes[..20].to_vec());
        assert!(matches!(Header::from_fd(&mut fd), Err(error::Error::Malformed(_))));
    }

    #[test]
    fn from_fd_reads_from_the_start() {
        let mut bytes = header_bytes(ELFCLASS64, ELFDATA2LSB, ET_REL);
        bytes.extend_from_slice(&[0xaa; 32]);
        let mut fd = Cursor::new(bytes);
        fd.set_position(50);
        let header = Header::from_fd(&mut fd).unwrap();
        assert_eq!(header.e_type, ET_REL);
        assert_eq!(et_to_str(header.e_type), "REL");
    }
}

//! The 64-bit ELF structures the resolver reads, and the section locator built on them.
//!
//! Only what symbol resolution needs is here: the file header, section headers, symbol table
//! entries, and lookup of sections by name. Everything is read through a `Read + Seek` source,
//! one table at a time, and every read is checked against the length of the source first. That
//! length is measured once per file and handed down, so buffered readers keep their buffer.

pub mod header;
pub mod locate;
pub mod section_header;
pub mod sym;

pub use header::Header;
pub use locate::{SectionLocator, locate};
pub use section_header::SectionHeader;
pub use sym::{Binding, Sym, Symtab};

use std::io::{self, Read, Seek, SeekFrom};

use crate::error;

/// Total length of the source in bytes. The current position is preserved.
pub(crate) fn stream_len<R: Seek>(fd: &mut R) -> error::Result<u64> {
    let current = fd.stream_position()?;
    let len = fd.seek(SeekFrom::End(0))?;
    if current != len {
        fd.seek(SeekFrom::Start(current))?;
    }
    Ok(len)
}

/// Reads exactly `len` bytes at `offset` of a source `size` bytes long, naming `what` in the
/// error if the source is too short.
pub(crate) fn read_at<R: Read + Seek>(
    fd: &mut R,
    size: u64,
    offset: u64,
    len: usize,
    what: &str,
) -> error::Result<Vec<u8>> {
    let end = offset
        .checked_add(len as u64)
        .ok_or_else(|| error::Error::Malformed(format!("{} at {:#x} overflows", what, offset)))?;
    if end > size {
        return Err(error::Error::Malformed(format!(
            "{} ({:#x}..{:#x}) extends past the end of the file ({:#x} bytes)",
            what, offset, end, size
        )));
    }
    let mut bytes = vec![0u8; len];
    fd.seek(SeekFrom::Start(offset))?;
    fd.read_exact(&mut bytes).map_err(|err| match err.kind() {
        io::ErrorKind::UnexpectedEof => {
            error::Error::Malformed(format!("{} at {:#x} is truncated", what, offset))
        }
        _ => error::Error::IO(err),
    })?;
    Ok(bytes)
}

/// Reads the contents of `shdr` from a source `size` bytes long. In permissive mode contents
/// running past the end of the file are clamped to what is there.
pub(crate) fn read_section<R: Read + Seek>(
    fd: &mut R,
    size: u64,
    shdr: &SectionHeader,
    what: &str,
    permissive: bool,
) -> error::Result<Vec<u8>> {
    if shdr.sh_type == section_header::SHT_NOBITS {
        return Ok(Vec::new());
    }
    let mut sh_size = shdr.sh_size;
    if permissive {
        let available = size.saturating_sub(shdr.sh_offset);
        if sh_size > available {
            log::warn!(
                "{} claims {:#x} bytes but only {:#x} remain in the file, clamping",
                what,
                sh_size,
                available
            );
            sh_size = available;
        }
    }
    if sh_size == 0 {
        return Ok(Vec::new());
    }
    let len = usize::try_from(sh_size).map_err(|_| {
        error::Error::Malformed(format!("{} size {:#x} is too large", what, sh_size))
    })?;
    read_at(fd, size, shdr.sh_offset, len, what)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn read_at_bounds() {
        let mut fd = Cursor::new(vec![1u8, 2, 3, 4, 5]);
        assert_eq!(read_at(&mut fd, 5, 1, 3, "bytes").unwrap(), vec![2, 3, 4]);
        assert_eq!(read_at(&mut fd, 5, 5, 0, "bytes").unwrap(), Vec::<u8>::new());
        assert!(matches!(
            read_at(&mut fd, 5, 3, 3, "bytes"),
            Err(error::Error::Malformed(_))
        ));
        assert!(matches!(
            read_at(&mut fd, 5, u64::MAX, 2, "bytes"),
            Err(error::Error::Malformed(_))
        ));
        // a source shorter than the length it was measured at
        assert!(matches!(
            read_at(&mut fd, 8, 3, 4, "bytes"),
            Err(error::Error::Malformed(_))
        ));
    }

    #[test]
    fn stream_len_keeps_position() {
        let mut fd = Cursor::new(vec![0u8; 16]);
        fd.set_position(4);
        assert_eq!(stream_len(&mut fd).unwrap(), 16);
        assert_eq!(fd.position(), 4);
    }

    #[test]
    fn read_section_clamps_when_permissive() {
        let mut fd = Cursor::new(b"\0abc\0de".to_vec());
        let shdr = SectionHeader {
            sh_type: section_header::SHT_STRTAB,
            sh_offset: 1,
            sh_size: 64,
            ..Default::default()
        };
        assert!(read_section(&mut fd, 7, &shdr, ".strtab", false).is_err());
        assert_eq!(
            read_section(&mut fd, 7, &shdr, ".strtab", true).unwrap(),
            b"abc\0de".to_vec()
        );
    }
}

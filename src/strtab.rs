//! A byte-offset based string table.
//! Commonly used in ELF binaries, for section names and symbol names.

use core::fmt;
use core::str;

use crate::error;

/// A common string table format which is indexed by byte offsets (and not
/// member index). Constructed using [`new`](#method.new)
/// with your choice of delimiter. Please be careful.
///
/// Lookups never read past the end of the table: a string missing its final delimiter ends
/// where the table ends.
#[derive(Clone, Copy, Default)]
pub struct Strtab<'a> {
    bytes: &'a [u8],
    delim: u8,
}

impl<'a> Strtab<'a> {
    /// Creates a `Strtab` directly without bounds check and without parsing it.
    pub fn new(bytes: &'a [u8], delim: u8) -> Self {
        Strtab { bytes, delim }
    }

    /// Size of the string table in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the table holds no bytes at all
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Gets the raw bytes of the string beginning at the given byte `offset`, without its
    /// delimiter.
    ///
    /// Returns `None` if `offset` is outside the table.
    pub fn get_bytes(&self, offset: usize) -> Option<&'a [u8]> {
        let tail = self.bytes.get(offset..)?;
        if tail.is_empty() && offset != 0 {
            return None;
        }
        let end = tail
            .iter()
            .position(|&b| b == self.delim)
            .unwrap_or(tail.len());
        Some(&tail[..end])
    }

    /// Gets a str reference from the backing bytes starting at byte `offset`.
    ///
    /// If the offset is out of bounds, `None` is returned; if the string is not valid UTF-8, an
    /// error is returned.
    pub fn get(&self, offset: usize) -> Option<error::Result<&'a str>> {
        self.get_bytes(offset).map(|bytes| {
            str::from_utf8(bytes).map_err(|_| {
                error::Error::Malformed(format!("string at offset {:#x} is not valid UTF-8", offset))
            })
        })
    }

    /// Whether the string at `offset` is exactly `name`, or `None` if `offset` is outside the table
    pub fn matches(&self, offset: usize, name: &[u8]) -> Option<bool> {
        self.get_bytes(offset).map(|bytes| bytes == name)
    }

    /// Like [`matches`](#method.matches), but an unversioned `name` also matches a symbol name
    /// carrying a GNU version suffix, `name@VERSION` or `name@@VERSION`, as linkers write them
    /// into `.strtab` for imported symbols.
    pub fn matches_symbol(&self, offset: usize, name: &[u8]) -> Option<bool> {
        self.get_bytes(offset).map(|bytes| {
            bytes == name
                || (!name.is_empty()
                    && !name.contains(&b'@')
                    && bytes.len() > name.len()
                    && bytes.starts_with(name)
                    && bytes[name.len()] == b'@')
        })
    }

    /// Converts the string table to a vector of parsed strings.
    pub fn to_vec(&self) -> error::Result<Vec<&'a str>> {
        let len = self.bytes.len();
        let mut strings = Vec::new();
        let mut i = 0;
        while i < len {
            let string = match self.get(i) {
                Some(string) => string?,
                None => break,
            };
            i += string.len() + 1;
            strings.push(string);
        }
        Ok(strings)
    }
}

impl<'a> fmt::Debug for Strtab<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Strtab")
            .field("delim", &self.delim)
            .field("bytes", &String::from_utf8_lossy(self.bytes))
            .finish()
    }
}

#[test]
fn as_vec_no_final_null() {
    let strtab = Strtab::new(b"\0printf\0memmove\0busta", 0x0);
    let vec = strtab.to_vec().unwrap();
    assert_eq!(vec.len(), 4);
    assert_eq!(vec, vec!["", "printf", "memmove", "busta"]);
}

#[test]
fn as_vec_no_first_null_no_final_null() {
    let strtab = Strtab::new(b"printf\0memmove\0busta", 0x0);
    let vec = strtab.to_vec().unwrap();
    assert_eq!(vec.len(), 3);
    assert_eq!(vec, vec!["printf", "memmove", "busta"]);
}

#[test]
fn to_vec_final_null() {
    let strtab = Strtab::new(b"\0printf\0memmove\0busta\0", 0x0);
    let vec = strtab.to_vec().unwrap();
    assert_eq!(vec.len(), 4);
    assert_eq!(vec, vec!["", "printf", "memmove", "busta"]);
}

#[test]
fn to_vec_newline_delim() {
    let strtab = Strtab::new(b"\nprintf\nmemmove\nbusta\n", b'\n');
    let vec = strtab.to_vec().unwrap();
    assert_eq!(vec.len(), 4);
    assert_eq!(vec, vec!["", "printf", "memmove", "busta"]);
}

#[test]
fn get_reads_to_terminator_not_query_length() {
    let strtab = Strtab::new(b"\0main_loop\0main\0", 0x0);
    assert_eq!(strtab.get_bytes(1), Some(&b"main_loop"[..]));
    assert_eq!(strtab.matches(1, b"main"), Some(false));
    assert_eq!(strtab.matches(1, b"main_loop_extra"), Some(false));
    assert_eq!(strtab.matches(11, b"main"), Some(true));
    // suffix sharing is how linkers pack names; an offset into the middle is a different string
    assert_eq!(strtab.get(6).unwrap().unwrap(), "loop");
}

#[test]
fn versioned_symbol_names() {
    let strtab = Strtab::new(b"\0printf@GLIBC_2.2.5\0exported@@VERS_1\0print\0@hidden\0", 0x0);
    assert_eq!(strtab.matches_symbol(1, b"printf"), Some(true));
    assert_eq!(strtab.matches_symbol(1, b"printf@GLIBC_2.2.5"), Some(true));
    assert_eq!(strtab.matches_symbol(1, b"printf@GLIBC_2.3"), Some(false));
    assert_eq!(strtab.matches_symbol(1, b"print"), Some(false));
    assert_eq!(strtab.matches(1, b"printf"), Some(false));
    assert_eq!(strtab.matches_symbol(20, b"exported"), Some(true));
    assert_eq!(strtab.matches_symbol(20, b"exported@"), Some(false));
    assert_eq!(strtab.matches_symbol(37, b"print"), Some(true));
    assert_eq!(strtab.matches_symbol(37, b"printf"), Some(false));
    assert_eq!(strtab.matches_symbol(43, b""), Some(false));
    assert_eq!(strtab.matches_symbol(100, b"printf"), None);
}

#[test]
fn get_out_of_bounds() {
    let strtab = Strtab::new(b"\0printf\0", 0x0);
    assert_eq!(strtab.get_bytes(8), None);
    assert_eq!(strtab.get_bytes(100), None);
    assert!(strtab.get(usize::MAX).is_none());
    assert_eq!(Strtab::default().get_bytes(0), Some(&b""[..]));
    assert_eq!(Strtab::default().get_bytes(1), None);
}

#[test]
fn unterminated_tail_is_bounded() {
    let strtab = Strtab::new(b"\0.symtab\0.strt", 0x0);
    assert_eq!(strtab.get_bytes(9), Some(&b".strt"[..]));
    assert_eq!(strtab.matches(9, b".strtab"), Some(false));
}

#[test]
fn invalid_utf8_is_an_error() {
    let strtab = Strtab::new(b"\0\xff\xfe\0", 0x0);
    assert!(strtab.get(1).unwrap().is_err());
    assert_eq!(strtab.get_bytes(1), Some(&b"\xff\xfe"[..]));
}

//! Symbol table entries, and the bindings, types and visibilities packed into them.

use core::fmt;

use scroll::{Endian, Pread, Pwrite, SizeWith};

use crate::elf::section_header::SHN_UNDEF;
use crate::error;

/// Size of a 64-bit symbol table entry.
pub const SIZEOF_SYM: usize = 4 + 1 + 1 + 2 + 8 + 8;

/// === Sym bindings ===
/// Local symbol.
pub const STB_LOCAL: u8 = 0;
/// Global symbol.
pub const STB_GLOBAL: u8 = 1;
/// Weak symbol.
pub const STB_WEAK: u8 = 2;
/// Start of OS-specific.
pub const STB_LOOS: u8 = 10;
/// Unique symbol..
pub const STB_GNU_UNIQUE: u8 = 10;
/// End of OS-specific.
pub const STB_HIOS: u8 = 12;
/// Start of processor-specific.
pub const STB_LOPROC: u8 = 13;
/// End of processor-specific.
pub const STB_HIPROC: u8 = 15;

/// === Sym types ===
/// Symbol type is unspecified.
pub const STT_NOTYPE: u8 = 0;
/// Symbol is a data object.
pub const STT_OBJECT: u8 = 1;
/// Symbol is a code object.
pub const STT_FUNC: u8 = 2;
/// Symbol associated with a section.
pub const STT_SECTION: u8 = 3;
/// Symbol's name is file name.
pub const STT_FILE: u8 = 4;
/// Symbol is a common data object.
pub const STT_COMMON: u8 = 5;
/// Symbol is thread-local data object.
pub const STT_TLS: u8 = 6;
/// Symbol is indirect code object.
pub const STT_GNU_IFUNC: u8 = 10;

/// === Sym visibility ===
/// Default: Visibility is specified by the symbol's binding type
pub const STV_DEFAULT: u8 = 0;
/// Internal: use of this attribute is currently reserved.
pub const STV_INTERNAL: u8 = 1;
/// Hidden: Not visible to other components, necessarily protected. Binding scope becomes local
/// when the object is included in an executable or shared object.
pub const STV_HIDDEN: u8 = 2;
/// Protected: Symbol defined in current component is visible in other components, but cannot be
/// preempted. Any reference from within the defining component must be resolved to the
/// definition in that component.
pub const STV_PROTECTED: u8 = 3;

/// Get the ST bind.
///
/// This is the first four bits of the byte.
#[inline]
pub fn st_bind(info: u8) -> u8 {
    info >> 4
}

/// Get the ST type.
///
/// This is the last four bits of the byte.
#[inline]
pub fn st_type(info: u8) -> u8 {
    info & 0xf
}

/// Get the ST visibility.
///
/// This is the last three bits of the `st_other` byte.
#[inline]
pub fn st_visibility(other: u8) -> u8 {
    other & 0x7
}

/// Get the string for some bind.
#[inline]
pub fn bind_to_str(typ: u8) -> &'static str {
    match typ {
        STB_LOCAL => "LOCAL",
        STB_GLOBAL => "GLOBAL",
        STB_WEAK => "WEAK",
        STB_GNU_UNIQUE => "GNU_UNIQUE",
        _ => "UNKNOWN_STB",
    }
}

/// Get the string for some type.
#[inline]
pub fn type_to_str(typ: u8) -> &'static str {
    match typ {
        STT_NOTYPE => "NOTYPE",
        STT_OBJECT => "OBJECT",
        STT_FUNC => "FUNC",
        STT_SECTION => "SECTION",
        STT_FILE => "FILE",
        STT_COMMON => "COMMON",
        STT_TLS => "TLS",
        STT_GNU_IFUNC => "GNU_IFUNC",
        _ => "UNKNOWN_STT",
    }
}

/// Get the string for some visibility
#[inline]
pub fn visibility_to_str(typ: u8) -> &'static str {
    match typ {
        STV_DEFAULT => "DEFAULT",
        STV_INTERNAL => "INTERNAL",
        STV_HIDDEN => "HIDDEN",
        STV_PROTECTED => "PROTECTED",
        _ => "UNKNOWN_STV",
    }
}

/// The linkage visibility of a symbol, decoded from the upper nibble of `st_info`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    /// Not visible outside the object file
    Local,
    /// Visible to all objects being combined
    Global,
    /// Global, but with lower precedence
    Weak,
    /// GNU extension: unique in the whole process
    GnuUnique,
    /// Reserved for operating system semantics
    Os(u8),
    /// Reserved for processor semantics
    Proc(u8),
    /// Not assigned by the ELF standard
    Unknown(u8),
}

impl From<u8> for Binding {
    /// Converts a raw `STB_*` value (already shifted out of `st_info`)
    fn from(bind: u8) -> Self {
        match bind {
            STB_LOCAL => Binding::Local,
            STB_GLOBAL => Binding::Global,
            STB_WEAK => Binding::Weak,
            STB_GNU_UNIQUE => Binding::GnuUnique,
            STB_LOOS..=STB_HIOS => Binding::Os(bind),
            STB_LOPROC..=STB_HIPROC => Binding::Proc(bind),
            _ => Binding::Unknown(bind),
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Binding::Local => f.write_str("LOCAL"),
            Binding::Global => f.write_str("GLOBAL"),
            Binding::Weak => f.write_str("WEAK"),
            Binding::GnuUnique => f.write_str("GNU_UNIQUE"),
            Binding::Os(bind) => write!(f, "LOOS+{}", bind - STB_LOOS),
            Binding::Proc(bind) => write!(f, "LOPROC+{}", bind - STB_LOPROC),
            Binding::Unknown(bind) => write!(f, "<unknown>: {}", bind),
        }
    }
}

/// A 64-bit symbol table entry
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Default, Pread, Pwrite, SizeWith)]
pub struct Sym {
    /// Symbol name (string tbl index)
    pub st_name: u32,
    /// Symbol type and binding
    pub st_info: u8,
    /// Symbol visibility
    pub st_other: u8,
    /// Section index
    pub st_shndx: u16,
    /// Symbol value
    pub st_value: u64,
    /// Symbol size
    pub st_size: u64,
}

impl Sym {
    /// Get the ST bind.
    ///
    /// This is the first four bits of the byte.
    #[inline]
    pub fn st_bind(&self) -> u8 {
        st_bind(self.st_info)
    }
    /// Get the ST type.
    ///
    /// This is the last four bits of the byte.
    #[inline]
    pub fn st_type(&self) -> u8 {
        st_type(self.st_info)
    }
    /// Get the ST visibility.
    ///
    /// This is the last three bits of the `st_other` byte.
    #[inline]
    pub fn st_visibility(&self) -> u8 {
        st_visibility(self.st_other)
    }
    /// The symbol's binding, decoded fresh from `st_info`
    #[inline]
    pub fn binding(&self) -> Binding {
        Binding::from(self.st_bind())
    }
    /// Checks whether this `Sym` has no defining section in this file
    #[inline]
    pub fn is_undefined(&self) -> bool {
        self.st_shndx == SHN_UNDEF
    }
}

impl fmt::Debug for Sym {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Sym")
            .field("st_name", &self.st_name)
            .field("st_value", &format_args!("0x{:x}", self.st_value))
            .field("st_size", &self.st_size)
            .field(
                "st_info",
                &format_args!(
                    "0x{:x} {} {}",
                    self.st_info,
                    bind_to_str(self.st_bind()),
                    type_to_str(self.st_type())
                ),
            )
            .field(
                "st_other",
                &format_args!(
                    "{} {}",
                    self.st_other,
                    visibility_to_str(self.st_visibility())
                ),
            )
            .field("st_shndx", &self.st_shndx)
            .finish()
    }
}

/// An ELF symbol table, decoding entries lazily out of its backing bytes
#[derive(Clone, Copy)]
pub struct Symtab<'a> {
    bytes: &'a [u8],
    count: usize,
    entsize: usize,
    endian: Endian,
}

impl<'a> Symtab<'a> {
    /// Parse a table of `count` symbols, each `entsize` bytes apart, starting at `offset`.
    ///
    /// `entsize` may exceed [`SIZEOF_SYM`]; the trailing bytes of each entry are ignored.
    pub fn parse(
        bytes: &'a [u8],
        offset: usize,
        count: usize,
        entsize: usize,
        endian: Endian,
    ) -> error::Result<Symtab<'a>> {
        if entsize < SIZEOF_SYM {
            return Err(error::Error::Malformed(format!(
                "symbol entry size {} is smaller than a symbol ({})",
                entsize, SIZEOF_SYM
            )));
        }
        let size = count.checked_mul(entsize).ok_or_else(|| {
            error::Error::Malformed(format!(
                "Too many ELF symbols (offset {:#x}, count {})",
                offset, count
            ))
        })?;
        let bytes = bytes.pread_with::<&[u8]>(offset, size)?;
        Ok(Symtab {
            bytes,
            count,
            entsize,
            endian,
        })
    }

    /// Try to get a symbol at the `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<Sym> {
        if index >= self.count {
            None
        } else {
            self.bytes.pread_with(index * self.entsize, self.endian).ok()
        }
    }

    /// The number of symbols in the table.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if table has no symbols.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Iterate over all symbols, in table order.
    #[inline]
    pub fn iter(&self) -> SymIterator<'a> {
        SymIterator {
            symtab: *self,
            index: 0,
        }
    }

    /// Parse all symbols into a vector.
    pub fn to_vec(&self) -> Vec<Sym> {
        self.iter().collect()
    }
}

impl<'a> fmt::Debug for Symtab<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Symtab")
            .field("count", &self.count)
            .field("entsize", &self.entsize)
            .field("endian", &self.endian)
            .finish()
    }
}

impl<'a> IntoIterator for &'_ Symtab<'a> {
    type Item = Sym;
    type IntoIter = SymIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over symbols in a [`Symtab`]
pub struct SymIterator<'a> {
    symtab: Symtab<'a>,
    index: usize,
}

impl<'a> Iterator for SymIterator<'a> {
    type Item = Sym;

    fn next(&mut self) -> Option<Self::Item> {
        let sym = self.symtab.get(self.index)?;
        self.index += 1;
        Some(sym)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.symtab.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SymIterator<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use scroll::{BE, LE};

    fn table(syms: &[Sym], entsize: usize, endian: Endian) -> Vec<u8> {
        let mut bytes = vec![0u8; syms.len() * entsize];
        for (i, sym) in syms.iter().enumerate() {
            bytes.pwrite_with(*sym, i * entsize, endian).unwrap();
        }
        bytes
    }

    #[test]
    fn size_of() {
        use scroll::ctx::SizeWith;
        assert_eq!(Sym::size_with(&LE), SIZEOF_SYM);
    }

    #[test]
    fn bindings() {
        assert_eq!(Binding::from(STB_LOCAL), Binding::Local);
        assert_eq!(Binding::from(STB_GLOBAL), Binding::Global);
        assert_eq!(Binding::from(STB_WEAK), Binding::Weak);
        assert_eq!(Binding::from(STB_GNU_UNIQUE), Binding::GnuUnique);
        assert_eq!(Binding::from(11), Binding::Os(11));
        assert_eq!(Binding::from(14), Binding::Proc(14));
        assert_eq!(Binding::from(5), Binding::Unknown(5));
        assert_eq!(Binding::Proc(14).to_string(), "LOPROC+1");

        // STB_GLOBAL | STT_FUNC
        let sym = Sym {
            st_info: 0x12,
            st_other: STV_HIDDEN,
            st_shndx: 14,
            ..Default::default()
        };
        assert_eq!(sym.binding(), Binding::Global);
        assert_eq!(sym.st_type(), STT_FUNC);
        assert!(!sym.is_undefined());
        assert_eq!(visibility_to_str(sym.st_visibility()), "HIDDEN");
        // STB_WEAK | STT_NOTYPE, undefined
        let sym = Sym {
            st_info: 0x20,
            ..Default::default()
        };
        assert_eq!(sym.binding(), Binding::Weak);
        assert!(sym.is_undefined());
    }

    #[test]
    fn iterate_in_table_order() {
        let syms = [
            Sym::default(),
            Sym {
                st_name: 1,
                st_info: 0x02,
                st_shndx: 14,
                st_value: 0x401000,
                st_size: 16,
                ..Default::default()
            },
            Sym {
                st_name: 7,
                st_info: 0x12,
                st_shndx: 14,
                st_value: 0x401136,
                st_size: 32,
                ..Default::default()
            },
        ];
        for endian in [LE, BE] {
            let bytes = table(&syms, SIZEOF_SYM, endian);
            let symtab = Symtab::parse(&bytes, 0, syms.len(), SIZEOF_SYM, endian).unwrap();
            assert_eq!(symtab.len(), 3);
            assert_eq!(symtab.iter().len(), 3);
            assert_eq!(symtab.to_vec(), syms.to_vec());
            assert_eq!(symtab.get(2).unwrap().st_value, 0x401136);
            assert!(symtab.get(3).is_none());
        }
    }

    #[test]
    fn padded_entries() {
        let syms = [
            Sym::default(),
            Sym {
                st_name: 9,
                st_info: 0x11,
                st_shndx: 22,
                st_value: 0x404028,
                ..Default::default()
            },
        ];
        let bytes = table(&syms, 32, LE);
        let symtab = Symtab::parse(&bytes, 0, 2, 32, LE).unwrap();
        assert_eq!((&symtab).into_iter().nth(1), Some(syms[1]));
    }

    #[test]
    fn bad_tables() {
        let bytes = vec![0u8; SIZEOF_SYM * 2];
        assert!(matches!(
            Symtab::parse(&bytes, 0, 2, 0, LE),
            Err(error::Error::Malformed(_))
        ));
        assert!(matches!(
            Symtab::parse(&bytes, 0, usize::MAX, SIZEOF_SYM, LE),
            Err(error::Error::Malformed(_))
        ));
        assert!(matches!(
            Symtab::parse(&bytes, 0, 3, SIZEOF_SYM, LE),
            Err(error::Error::Scroll(_))
        ));
        assert!(Symtab::parse(&bytes, 0, 0, SIZEOF_SYM, LE).unwrap().is_empty());
    }
}

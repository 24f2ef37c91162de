//! Symbol resolution: finding out where a named symbol of an executable will be loaded.
//!
//! The full symbol table (`.symtab`) is scanned in table order, with names read from `.strtab`.
//! A name without a version also matches entries recorded with one, such as `printf@GLIBC_2.2.5`.
//! The first globally bound entry with the requested name decides the outcome: defined in one of
//! the executable's sections, the loader places it at the entry's value; with an undefined
//! section index, a shared library supplies it at load time. Entries with any other binding only
//! record that the name exists and the scan goes on, so a later global entry still wins.

use core::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use log::{debug, trace, warn};

use crate::elf::header::{Header, et_to_str};
use crate::elf::locate::SectionLocator;
use crate::elf::section_header::{SHT_STRTAB, SHT_SYMTAB, STRTAB, SYMTAB};
use crate::elf::sym::{Binding, SIZEOF_SYM, Symtab};
use crate::error;
use crate::options::{ParseOptions, Permissive};
use crate::strtab::Strtab;

/// How a symbol lookup turned out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Globally bound and defined in the executable
    GlobalDefined {
        /// The virtual address the symbol will be loaded to
        address: u64,
    },
    /// No symbol of that name
    NotFound,
    /// Only entries with non-global bindings have that name
    LocalOnly,
    /// The file is not an `ET_EXEC` executable
    NotExecutable,
    /// Globally bound, but undefined here: a shared library provides it at load time
    GlobalUndefined,
}

impl Outcome {
    /// The address the symbol will be loaded to, or 0 unless the symbol is [`Outcome::GlobalDefined`]
    pub fn address(&self) -> u64 {
        match *self {
            Outcome::GlobalDefined { address } => address,
            _ => 0,
        }
    }

    /// Whether the symbol is global and defined in the executable
    pub fn is_defined(&self) -> bool {
        matches!(self, Outcome::GlobalDefined { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Outcome::GlobalDefined { address } => write!(f, "global, defined at 0x{:x}", address),
            Outcome::NotFound => f.write_str("not found"),
            Outcome::LocalOnly => f.write_str("not global"),
            Outcome::NotExecutable => f.write_str("not an executable"),
            Outcome::GlobalUndefined => f.write_str("global, supplied by a shared library"),
        }
    }
}

/// Resolves symbols of executables with a fixed set of [`ParseOptions`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resolver {
    options: ParseOptions,
}

impl Resolver {
    /// A resolver that fails on any malformed table
    pub fn new() -> Self {
        Default::default()
    }

    /// A resolver using `options`
    pub fn with_options(options: ParseOptions) -> Self {
        Resolver { options }
    }

    /// The options this resolver parses with
    pub fn options(&self) -> ParseOptions {
        self.options
    }

    /// Resolves `name` in the executable at `path`.
    ///
    /// The file is opened read-only and closed before returning.
    pub fn resolve<P: AsRef<Path>>(&self, name: &str, path: P) -> error::Result<Outcome> {
        let path = path.as_ref();
        debug!("resolving {} in {}", name, path.display());
        let mut fd = BufReader::new(File::open(path)?);
        self.resolve_reader(name, &mut fd)
    }

    /// Resolves `name` in the executable read from `fd`, which must be positioned anywhere in a
    /// stream that starts with the ELF header.
    pub fn resolve_reader<R: Read + Seek>(&self, name: &str, fd: &mut R) -> error::Result<Outcome> {
        let permissive = self.options.is_permissive();
        let header = Header::from_fd(fd)?;
        trace!("{:?}", header);
        if !header.is_executable() {
            debug!("file type is {}, not EXEC", et_to_str(header.e_type));
            return Ok(Outcome::NotExecutable);
        }
        if name.is_empty() {
            return Ok(Outcome::NotFound);
        }

        let mut locator = SectionLocator::new(&header, fd, self.options)?;
        let symtab_shdr = locator.locate(SYMTAB)?;
        let strtab_shdr = locator.locate(STRTAB)?;
        if symtab_shdr.sh_type != SHT_SYMTAB {
            warn!("{} has unexpected type {:#x}", SYMTAB, symtab_shdr.sh_type);
        }
        if strtab_shdr.sh_type != SHT_STRTAB {
            warn!("{} has unexpected type {:#x}", STRTAB, strtab_shdr.sh_type);
        }

        let endian = header.endianness()?;
        let entsize = usize::try_from(symtab_shdr.sh_entsize)
            .ok()
            .filter(|&entsize| entsize >= SIZEOF_SYM)
            .ok_or_else(|| {
                error::Error::Malformed(format!(
                    "{} entry size {} is smaller than a symbol ({})",
                    SYMTAB, symtab_shdr.sh_entsize, SIZEOF_SYM
                ))
            })
            .or_permissive_and_value(permissive, "bad symbol entry size", SIZEOF_SYM)?;
        let strtab_bytes = locator.read_section(&strtab_shdr, STRTAB)?;
        let symtab_bytes = locator.read_section(&symtab_shdr, SYMTAB)?;
        let strtab = Strtab::new(&strtab_bytes, 0x0);
        let symtab = Symtab::parse(
            &symtab_bytes,
            0,
            symtab_bytes.len() / entsize,
            entsize,
            endian,
        )?;
        debug!("scanning {} symbols for {}", symtab.len(), name);

        let mut non_global_seen = false;
        // index 0 is the reserved undefined symbol
        for (index, sym) in symtab.iter().enumerate().skip(1) {
            let matched = strtab
                .matches_symbol(sym.st_name as usize, name.as_bytes())
                .ok_or_else(|| {
                    error::Error::Malformed(format!(
                        "symbol {} name offset {:#x} is outside {} ({:#x} bytes)",
                        index,
                        sym.st_name,
                        STRTAB,
                        strtab.len()
                    ))
                })
                .or_permissive_and_default(permissive, "skipping symbol")?;
            if !matched {
                continue;
            }
            trace!("symbol {} matches: {:?}", index, sym);
            match sym.binding() {
                Binding::Global if sym.is_undefined() => return Ok(Outcome::GlobalUndefined),
                Binding::Global => {
                    return Ok(Outcome::GlobalDefined {
                        address: sym.st_value,
                    });
                }
                binding => {
                    debug!("symbol {} has {} binding, continuing", index, binding);
                    non_global_seen = true;
                }
            }
        }

        if non_global_seen {
            Ok(Outcome::LocalOnly)
        } else {
            Ok(Outcome::NotFound)
        }
    }
}

/// Resolves `name` in the executable at `path` with the default, strict, options.
///
/// ```rust,no_run
/// let outcome = findsym::resolve("main", "./a.out")?;
/// println!("main will be loaded to {:#x}", outcome.address());
/// # Ok::<(), findsym::error::Error>(())
/// ```
pub fn resolve<P: AsRef<Path>>(name: &str, path: P) -> error::Result<Outcome> {
    Resolver::new().resolve(name, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_only_for_defined() {
        assert_eq!(Outcome::GlobalDefined { address: 0x401136 }.address(), 0x401136);
        assert!(Outcome::GlobalDefined { address: 0 }.is_defined());
        for outcome in [
            Outcome::NotFound,
            Outcome::LocalOnly,
            Outcome::NotExecutable,
            Outcome::GlobalUndefined,
        ] {
            assert_eq!(outcome.address(), 0);
            assert!(!outcome.is_defined());
        }
    }

    #[test]
    fn display() {
        assert_eq!(
            Outcome::GlobalDefined { address: 0x401136 }.to_string(),
            "global, defined at 0x401136"
        );
        assert_eq!(Outcome::LocalOnly.to_string(), "not global");
    }

    #[test]
    fn missing_file_is_io() {
        let err = resolve("main", "/nonexistent/findsym/a.out").unwrap_err();
        assert!(err.is_io());
    }
}

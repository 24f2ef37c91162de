//! A custom findsym error
//!

use core::fmt;
use core::result;
use std::{error, io};

#[non_exhaustive]
#[derive(Debug)]
/// A custom findsym error
pub enum Error {
    /// The binary is malformed somehow
    Malformed(String),
    /// The binary's magic is unknown or bad
    BadMagic(u64),
    /// A section the resolver depends on is not in the section header table
    MissingSection(String),
    /// An error emanating from reading and interpreting bytes
    Scroll(scroll::Error),
    /// An IO based error
    IO(io::Error),
}

impl Error {
    /// Whether the file could not be opened or read, as opposed to having bad contents.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::IO(_))
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::IO(ref io) => Some(io),
            Error::Scroll(ref scroll) => Some(scroll),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IO(err)
    }
}

impl From<scroll::Error> for Error {
    fn from(err: scroll::Error) -> Error {
        Error::Scroll(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::IO(ref err) => write!(fmt, "{}", err),
            Error::Scroll(ref err) => write!(fmt, "{}", err),
            Error::BadMagic(magic) => write!(fmt, "Invalid magic number: 0x{:x}", magic),
            Error::Malformed(ref msg) => write!(fmt, "Malformed entity: {}", msg),
            Error::MissingSection(ref name) => write!(fmt, "No {} section in binary", name),
        }
    }
}

/// An impish result
pub type Result<T> = result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_are_distinguished() {
        let err: Error = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(err.is_io());
        assert!(!Error::Malformed("bad".into()).is_io());
        assert!(!Error::MissingSection(".symtab".into()).is_io());
    }

    #[test]
    fn display_names_the_missing_section() {
        let err = Error::MissingSection(".symtab".into());
        assert_eq!(err.to_string(), "No .symtab section in binary");
        assert_eq!(Error::BadMagic(0x464c457f).to_string(), "Invalid magic number: 0x464c457f");
    }
}

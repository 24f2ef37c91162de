//! # findsym
//!
//! Answers one question about a 64-bit ELF executable: where will the loader put a given symbol?
//!
//! The symbol is looked up by name in the executable's `.symtab`, using `.strtab` for names, and
//! the match is classified by its binding and defining section:
//!
//! * a global symbol defined in the executable resolves to its virtual address
//! * a global symbol with an undefined section index comes from a shared library at load time
//! * a symbol with only local (or weak) bindings is not a global symbol
//! * anything else is not found
//!
//! Files whose type is not `ET_EXEC` are rejected before any table is read.
//!
//! # Example
//!
//! ```rust,no_run
//! use findsym::{Outcome, Resolver};
//!
//! fn run() -> findsym::error::Result<()> {
//!     match Resolver::new().resolve("main", "/usr/bin/some-static-binary")? {
//!         Outcome::GlobalDefined { address } => println!("main will be loaded to {:#x}", address),
//!         outcome => println!("main: {:?}", outcome),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! The `cli` feature (on by default) builds the `findsym` binary on top of this crate.

pub mod elf;
pub mod error;
pub mod options;
pub mod resolve;
pub mod strtab;

pub use crate::options::{ParseMode, ParseOptions};
pub use crate::resolve::{Outcome, Resolver, resolve};

#![no_main]
use std::io::Cursor;

use findsym::elf::{Header, SectionLocator};
use findsym::{ParseOptions, Resolver};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for options in [ParseOptions::strict(), ParseOptions::permissive()] {
        let resolver = Resolver::with_options(options);
        for name in ["main", "_start", "printf"] {
            let _ = resolver.resolve_reader(name, &mut Cursor::new(data));
        }
    }

    let mut fd = Cursor::new(data);
    if let Ok(header) = Header::from_fd(&mut fd) {
        if let Ok(mut locator) = SectionLocator::new(&header, &mut fd, ParseOptions::permissive()) {
            for index in 0..locator.len().min(64) {
                let _ = locator.section(index);
            }
            let _ = locator.locate(".symtab");
        }
    }
});

//! `findsym SYMBOL EXECUTABLE`: report where a symbol of a 64-bit ELF executable will be loaded.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use findsym::{Outcome, ParseOptions, Resolver};

#[derive(Parser)]
#[command(name = "findsym", version, about)]
struct Cli {
    /// Name of the symbol to look up in `.symtab`
    symbol: String,

    /// Path to a 64-bit ELF executable
    executable: PathBuf,

    /// Skip over malformed names and clamp truncated sections instead of failing
    #[arg(long)]
    permissive: bool,

    /// Exit with status 0 whatever the symbol's outcome (errors still fail)
    #[arg(long)]
    always_succeed: bool,

    /// More log output on stderr, repeat for more
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// No log output at all
    #[arg(short, long)]
    quiet: bool,
}

const EXIT_IO: u8 = 5;
const EXIT_MALFORMED: u8 = 6;
/// `EX_USAGE`; clap's own usage status, 2, is taken by [`Outcome::LocalOnly`]
const EXIT_USAGE: u8 = 64;

fn exit_status(outcome: Outcome) -> u8 {
    match outcome {
        Outcome::GlobalDefined { .. } => 0,
        Outcome::NotFound => 1,
        Outcome::LocalOnly => 2,
        Outcome::NotExecutable => 3,
        Outcome::GlobalUndefined => 4,
    }
}

fn report(cli: &Cli, outcome: Outcome) -> String {
    let symbol = &cli.symbol;
    match outcome {
        Outcome::GlobalDefined { address } => format!("{} will be loaded to 0x{:x}", symbol, address),
        Outcome::LocalOnly => format!("{} is not a global symbol! :(", symbol),
        Outcome::NotFound => format!("{} not found!", symbol),
        Outcome::NotExecutable => format!("{} not an executable! :(", cli.executable.display()),
        Outcome::GlobalUndefined => format!(
            "{} is a global symbol, but will come from a shared library",
            symbol
        ),
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if err.use_stderr() => {
            let _ = err.print();
            return ExitCode::from(EXIT_USAGE);
        }
        // --help and --version
        Err(err) => err.exit(),
    };

    if let Err(err) = stderrlog::new()
        .module(module_path!())
        .quiet(cli.quiet)
        .verbosity(usize::from(cli.verbose) + 1)
        .init()
    {
        eprintln!("warning: could not set up logging: {}", err);
    }

    let options = if cli.permissive {
        ParseOptions::permissive()
    } else {
        ParseOptions::strict()
    };
    match Resolver::with_options(options).resolve(&cli.symbol, &cli.executable) {
        Ok(outcome) => {
            println!("{}", report(&cli, outcome));
            if cli.always_succeed {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(exit_status(outcome))
            }
        }
        Err(err) => {
            eprintln!("error: {}: {}", cli.executable.display(), err);
            ExitCode::from(if err.is_io() { EXIT_IO } else { EXIT_MALFORMED })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn reports() {
        let cli = cli(&["findsym", "main", "./a.out"]);
        assert_eq!(
            report(&cli, Outcome::GlobalDefined { address: 0x401136 }),
            "main will be loaded to 0x401136"
        );
        assert_eq!(report(&cli, Outcome::NotFound), "main not found!");
        assert_eq!(report(&cli, Outcome::LocalOnly), "main is not a global symbol! :(");
        assert_eq!(report(&cli, Outcome::NotExecutable), "./a.out not an executable! :(");
        assert_eq!(
            report(&cli, Outcome::GlobalUndefined),
            "main is a global symbol, but will come from a shared library"
        );
    }

    #[test]
    fn flags() {
        let cli = cli(&["findsym", "-vv", "--permissive", "printf", "/bin/true"]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.permissive);
        assert!(!cli.always_succeed);
        assert!(Cli::try_parse_from(["findsym", "main"]).is_err());
    }

    #[test]
    fn usage_errors_have_their_own_status() {
        let usage = Cli::try_parse_from(["findsym", "main"]).err().unwrap();
        assert!(usage.use_stderr());
        // what clap would have exited with
        assert_eq!(usage.exit_code(), i32::from(exit_status(Outcome::LocalOnly)));
        let help = Cli::try_parse_from(["findsym", "--help"]).err().unwrap();
        assert!(!help.use_stderr());

        let outcomes = [
            Outcome::GlobalDefined { address: 0x401136 },
            Outcome::NotFound,
            Outcome::LocalOnly,
            Outcome::NotExecutable,
            Outcome::GlobalUndefined,
        ];
        for outcome in outcomes {
            assert_ne!(exit_status(outcome), EXIT_USAGE);
        }
        assert_ne!(EXIT_USAGE, EXIT_IO);
        assert_ne!(EXIT_USAGE, EXIT_MALFORMED);
    }

    #[test]
    fn only_defined_symbols_succeed() {
        assert_eq!(exit_status(Outcome::GlobalDefined { address: 0x401136 }), 0);
        assert_eq!(exit_status(Outcome::NotFound), 1);
        assert_eq!(exit_status(Outcome::LocalOnly), 2);
        assert_eq!(exit_status(Outcome::NotExecutable), 3);
        assert_eq!(exit_status(Outcome::GlobalUndefined), 4);
    }
}

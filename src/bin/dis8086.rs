use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use yaxpeax_arch::U8Reader;

use yaxpeax_8086::{write_listing, DisplayStyle, InstDecoder, ListingError, SizeHints};

/// dis8086 - disassemble 8086 `mov` instructions
#[derive(Parser, Debug)]
#[command(name = "dis8086", version, about = "Disassemble 8086 mov instructions into nasm syntax")]
struct Args {
    /// Binary to disassemble. Reads stdin when omitted or `-`.
    input: Option<PathBuf>,

    /// Write the listing here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// When to write `byte`/`word` on immediate operands
    #[arg(long, value_enum, default_value_t = SizeHintArg::Memory)]
    size_hints: SizeHintArg,

    /// Start the listing with `bits 16`, so nasm can reassemble it
    #[arg(long)]
    header: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum SizeHintArg {
    /// Only when the other operand is memory
    Memory,
    /// On every immediate
    Always,
}

impl From<SizeHintArg> for SizeHints {
    fn from(arg: SizeHintArg) -> Self {
        match arg {
            SizeHintArg::Memory => SizeHints::Memory,
            SizeHintArg::Always => SizeHints::Always,
        }
    }
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) if path != Path::new("-") => {
            fs::read(path).with_context(|| format!("reading {}", path.display()))
        }
        _ => {
            let mut bytes = Vec::new();
            io::stdin().lock().read_to_end(&mut bytes).context("reading stdin")?;
            Ok(bytes)
        }
    }
}

fn write_output(path: Option<&Path>, listing: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, listing).with_context(|| format!("writing {}", path.display()))
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(listing.as_bytes()).context("writing stdout")?;
            stdout.flush().context("writing stdout")
        }
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let bytes = read_input(args.input.as_deref())?;
    info!("decoding {} bytes", bytes.len());

    let style = DisplayStyle { size_hints: args.size_hints.into() };
    debug!("display style: {:?}", style);

    let mut listing = String::new();
    if args.header {
        listing.push_str("bits 16\n\n");
    }

    let mut reader = U8Reader::new(&bytes);
    let result = write_listing(&InstDecoder::default(), &mut reader, &mut listing, style);

    // lines decoded before a failure are still part of the output
    write_output(args.output.as_deref(), &listing)?;

    match result {
        Ok(count) => {
            info!("decoded {} instructions", count);
            Ok(ExitCode::SUCCESS)
        }
        Err(ListingError::Decode(e)) => {
            eprintln!("FATAL: {}", e);
            Ok(ExitCode::FAILURE)
        }
        Err(e @ ListingError::Write(_)) => Err(e).context("formatting listing"),
    }
}

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use yaxpeax_8086::{disassemble_into, InstDecoder, ASM_HEADER};

/// Disassemble raw 8086 `mov` machine code into a listing nasm can reassemble.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// File of raw machine code
    input: PathBuf,

    /// Write the listing here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Leave out the `bits 16` header line
    #[arg(long)]
    no_header: bool,

    /// Print 8-bit displacements unsigned, as in `[bx + 219]` rather than `[bx - 37]`
    #[arg(long)]
    raw_byte_displacements: bool,

    /// Fail on `mov r/m, imm` encodings with a non-zero reg field
    #[arg(long)]
    strict: bool,
}

impl Args {
    fn decoder(&self) -> InstDecoder {
        let mut decoder = InstDecoder::default();
        if self.raw_byte_displacements {
            decoder = decoder.raw_byte_displacements();
        }
        if self.strict {
            decoder = decoder.strict();
        }
        decoder
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let data = fs::read(&args.input)
        .with_context(|| format!("could not read {}", args.input.display()))?;

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("could not create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    info!("disassembling {} bytes from {}", data.len(), args.input.display());

    let mut listing = String::new();
    if !args.no_header {
        listing.push_str(ASM_HEADER);
        listing.push('\n');
    }
    let result = disassemble_into(&args.decoder(), &data, &mut listing);

    // whatever decoded before an error still gets written out
    out.write_all(listing.as_bytes()).context("could not write listing")?;
    out.flush().context("could not write listing")?;

    let count = result.with_context(|| format!("could not disassemble {}", args.input.display()))?;
    info!("wrote {} instructions", count);
    Ok(())
}

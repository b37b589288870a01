use std::io::{self, Read, Write};

use clap::Parser;
use pdx_cli::args::PdxArgs;
use pdx_cli::{process, Envelope, ProcessOptions};

fn main() -> anyhow::Result<()> {
    let args = PdxArgs::parse();
    pdx_common::log::setup_stderr_logging(args.verbose, args.log_spans);

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| anyhow::anyhow!("failed to read stdin: {e}"))?;

    let opts = ProcessOptions::from(&args);
    let (content, changed) = process(&input, &opts);
    let envelope = Envelope { content, changed };

    let json = serde_json::to_string(&envelope)
        .map_err(|e| anyhow::anyhow!("failed to serialize output envelope: {e}"))?;
    let mut stdout = io::stdout();
    writeln!(stdout, "{json}")?;
    Ok(())
}

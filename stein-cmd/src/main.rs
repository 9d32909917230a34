mod decode;
mod info;
mod sub20;

use std::io::stderr;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode events from an ASCII hex dump of flight software packets.
    ///
    /// Each line of the dump is a single 512 byte packet written as hex tokens, e.g., 0xaf,
    /// Packets that are too short or contain malformed tokens are logged and skipped.
    Fsw {
        /// Input ASCII hex dump file
        input: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: decode::Format,

        /// Number of decode threads. 1 decodes on the main thread, 0 uses one thread per
        /// available CPU.
        #[arg(short = 'j', long, default_value_t = 1, value_name = "num")]
        threads: usize,

        /// Number of packets decoded together when using more than one thread.
        #[arg(long, default_value_t = 64, value_name = "num")]
        batch_size: usize,
    },
    /// Decode events from raw binary 4-byte event records.
    Raw {
        /// Input raw binary file
        input: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: decode::Format,
    },
    /// Convert a SUB-20 interface log to raw binary event records.
    ///
    /// The output can be decoded with the raw subcommand.
    Sub20 {
        /// Input SUB-20 log file
        input: PathBuf,

        /// Delete output file if it already exists
        #[arg(long, action)]
        clobber: bool,

        /// Output file path.
        #[arg(short, long, default_value = "binary.log", value_name = "path")]
        output: PathBuf,
    },
    /// Show a summary of the events decoded from a file
    Info {
        /// Input file
        input: PathBuf,

        /// Type of input file
        #[arg(short, long, default_value = "fsw")]
        input_type: info::InputType,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: info::Format,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(stderr)
        .with_ansi(false)
        .without_time()
        .with_env_filter(
            EnvFilter::try_from_env("STEIN_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    debug!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Fsw {
            input,
            format,
            threads,
            batch_size,
        } => decode::fsw(input, *format, *threads, *batch_size),
        Commands::Raw { input, format } => decode::raw(input, *format),
        Commands::Sub20 {
            input,
            clobber,
            output,
        } => {
            if !clobber && output.exists() {
                bail!("{output:?} exists; use --clobber");
            }
            info!("converting {input:?} to {output:?}");
            sub20::convert(input, output)
        }
        Commands::Info {
            input,
            input_type,
            format,
        } => info::info(input, input_type, format),
    }
}

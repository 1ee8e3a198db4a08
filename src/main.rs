//! machotbd - Generate text-based dylib stubs from Mach-O libraries.
//!
//! Reads a thin or universal dylib and prints (or writes) its tbd stub.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use machotbd::{emit, generate_tbd, Emission, Platform, TbdOptions};

/// Generate a text-based dylib (tbd) stub from a Mach-O library.
#[derive(Parser, Debug)]
#[command(name = "machotbd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Mach-O dylib to read (thin or universal)
    input: PathBuf,

    /// Path the tbd should be written to (disables printing to stdout)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Print the tbd to stdout
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    print: bool,

    /// Platform to define in the output tbd (ios or macosx)
    #[arg(short, long, default_value = "ios")]
    platform: Platform,

    /// Verbosity level (0=quiet, 1=warnings, 2=info, 3=debug)
    #[arg(short, long, default_value = "2")]
    verbosity: u8,
}

impl Cli {
    fn options(&self) -> TbdOptions {
        let options = TbdOptions {
            output_path: None,
            echo_to_console: self.print,
            platform: self.platform,
        };
        match &self.out {
            Some(path) => options.with_output(path),
            None => options,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbosity);

    let start = Instant::now();
    let options = cli.options();

    let (text, report) = generate_tbd(&cli.input, &options)
        .with_context(|| format!("Failed to generate tbd for {}", cli.input.display()))?;

    if !report.warnings.is_empty() {
        info!("{} warnings while parsing", report.warnings.len());
    }

    match emit(&text, &options) {
        Emission::FellBack(e) => {
            info!("Output fell back to stdout: {}", e);
        }
        Emission::Written(_) | Emission::Echoed | Emission::Suppressed => {}
    }

    info!(
        "Generated tbd for {} in {:.2}s",
        cli.input.display(),
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        _ => Level::DEBUG,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).ok();
}

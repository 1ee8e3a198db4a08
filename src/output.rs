//! Output emission for rendered tbd text.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::TbdOptions;

/// Where the rendered text ended up.
#[derive(Debug)]
pub enum Emission {
    /// Written to the output file
    Written(PathBuf),
    /// Printed to the console
    Echoed,
    /// Writing the output file failed; printed to the console instead.
    /// Carries the file error even if the console write failed too.
    FellBack(Error),
    /// No output file and console echo disabled
    Suppressed,
}

/// Writes `text` to `path`, replacing any previous contents.
///
/// A missing file is created and the write retried once.
pub fn write_output(path: &Path, text: &str) -> Result<()> {
    let write_err = |source: io::Error| Error::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    let file = match OpenOptions::new().write(true).truncate(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("{} does not exist, creating it", path.display());
            File::create(path).map_err(write_err)?
        }
        Err(e) => return Err(write_err(e)),
    };

    let mut writer = BufWriter::new(file);
    writer.write_all(text.as_bytes()).map_err(write_err)?;
    let file = writer.into_inner().map_err(|e| write_err(e.into_error()))?;
    file.sync_all().map_err(write_err)?;

    Ok(())
}

/// Emits `text` according to `options`, using `console` for echoing.
///
/// An output path always wins over console echo. If the file cannot be
/// written the text goes to the console instead.
pub fn emit_to<W: Write>(text: &str, options: &TbdOptions, console: &mut W) -> Emission {
    match &options.output_path {
        Some(path) => match write_output(path, text) {
            Ok(()) => {
                info!("Wrote to {}", path.display());
                Emission::Written(path.clone())
            }
            Err(e) => {
                error!("{}; printing to stdout", e);
                if let Err(console_err) = console.write_all(text.as_bytes()) {
                    error!("printing to stdout failed: {}", console_err);
                }
                Emission::FellBack(e)
            }
        },
        None if options.echo_to_console => match console.write_all(text.as_bytes()) {
            Ok(()) => Emission::Echoed,
            Err(e) => Emission::FellBack(Error::Io(e)),
        },
        None => Emission::Suppressed,
    }
}

/// Emits `text` according to `options`, echoing to stdout.
pub fn emit(text: &str, options: &TbdOptions) -> Emission {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    let emission = emit_to(text, options, &mut lock);
    let _ = lock.flush();
    emission
}

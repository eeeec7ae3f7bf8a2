//! Print sinks.

use super::render::RenderedPass;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrintError {
    #[error("failed to write pass: {0}")]
    Io(#[from] std::io::Error),
    #[error("print command `{command}` failed: {detail}")]
    Command { command: String, detail: String },
}

/// Destination for rendered passes.
pub trait PrintSink {
    /// Hands `pass` over for printing.
    fn print(&self, pass: &RenderedPass) -> Result<(), PrintError>;
}

/// Writes each pass as an HTML page named after its code.
#[derive(Debug, Clone)]
pub struct FilePrinter {
    dir: PathBuf,
}

impl FilePrinter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Where `pass` is written. Only ASCII letters, digits and `-` from the
    /// code reach the file name, so the page always lands inside the directory.
    pub fn path_for(&self, pass: &RenderedPass) -> PathBuf {
        let stem: String = pass
            .code_value()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect();
        self.dir.join(format!("pass-{stem}.html"))
    }

    fn write(&self, pass: &RenderedPass) -> Result<PathBuf, PrintError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(pass);
        std::fs::write(&path, pass.to_html())?;
        Ok(path)
    }
}

impl PrintSink for FilePrinter {
    fn print(&self, pass: &RenderedPass) -> Result<(), PrintError> {
        let path = self.write(pass)?;
        tracing::info!(path = %path.display(), "Pass written");
        Ok(())
    }
}

/// Sends passes to a platform print command such as `lp`.
#[derive(Debug, Clone)]
pub struct CommandPrinter {
    program: String,
    args: Vec<String>,
    spool: FilePrinter,
}

impl CommandPrinter {
    /// Prints with `program`, spooling pages under `spool_dir` first.
    pub fn new(program: impl Into<String>, spool_dir: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            spool: FilePrinter::new(spool_dir.as_ref()),
        }
    }

    /// Extra arguments placed before the file path.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl PrintSink for CommandPrinter {
    fn print(&self, pass: &RenderedPass) -> Result<(), PrintError> {
        let path = self.spool.write(pass)?;
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&path)
            .output()
            .map_err(|e| PrintError::Command {
                command: self.program.clone(),
                detail: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(PrintError::Command {
                command: self.program.clone(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        tracing::info!(program = %self.program, path = %path.display(), "Pass sent to printer");
        Ok(())
    }
}

use std::{
    fmt::Display,
    io::{self, BufRead, Write},
};

use anyhow::{Context, Result, bail};
use derive_more::Debug;
use tracing::warn;

/// User-facing terminal: progress lines out, passphrases in.
///
/// Diagnostics go through `tracing`; this is only for what the user is meant to read.
#[derive(Debug)]
pub struct Console {
    #[debug(skip)]
    input: Box<dyn BufRead + Send>,
    #[debug(skip)]
    output: Box<dyn Write + Send>,
}

impl Console {
    pub fn new(input: Box<dyn BufRead + Send>, output: Box<dyn Write + Send>) -> Self {
        Self { input, output }
    }

    pub fn stdio() -> Self {
        Self::new(Box::new(io::BufReader::new(io::stdin())), Box::new(io::stdout()))
    }

    /// Prints one line.
    pub fn say(&mut self, line: impl Display) {
        if let Err(e) = writeln!(self.output, "{line}").and_then(|_| self.output.flush()) {
            warn!(error = &e as &dyn std::error::Error, "Failed to write to console");
        }
    }

    /// Prints `message` without a newline and reads one line of input.
    pub fn prompt(&mut self, message: &str) -> Result<String> {
        write!(self.output, "{message}").and_then(|_| self.output.flush())?;
        let mut answer = String::new();
        let read = self.input.read_line(&mut answer).context("Failed to read from stdin")?;
        if read == 0 {
            bail!("No input given for prompt '{message}'");
        }
        Ok(answer.trim_end_matches(['\r', '\n']).to_string())
    }
}

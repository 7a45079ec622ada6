/// Interactive line source for test mode
///
/// Lets an operator type `EMIT ...` frames instead of wiring up the
/// controller board.
use std::io::{self, BufRead, Write};

use super::LineSource;
use crate::error::TransportError;

const PROMPT: &str = "enter input: ";

pub struct StdinLineSource {
    prompt: bool,
}

impl StdinLineSource {
    pub fn new() -> Self {
        Self { prompt: true }
    }

    /// Read without printing a prompt (piped input)
    pub fn quiet() -> Self {
        Self { prompt: false }
    }
}

impl Default for StdinLineSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LineSource for StdinLineSource {
    fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        if self.prompt {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(PROMPT.as_bytes())
                .and_then(|_| stdout.flush())
                .map_err(|err| TransportError::io("stdout", err))?;
        }

        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|err| TransportError::io("stdin", err))?;

        if read == 0 {
            return Err(TransportError::EndOfStream);
        }

        Ok(Some(line.trim().to_string()))
    }

    fn name(&self) -> &str {
        "stdin"
    }
}

/// Inbound line protocol
///
/// One frame per line, whitespace separated: `EMIT <SIGNAL> [<arg> ...]`.
/// Anything else is not a frame and is ignored by the ingest loop.

/// Frame keyword
pub const EMIT: &str = "EMIT";

/// Parsed `EMIT` frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalEvent {
    pub signal: String,
    pub args: Vec<String>,
}

impl SignalEvent {
    pub fn new(signal: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            signal: signal.into(),
            args,
        }
    }

    /// Parse a device line. Returns `None` for lines that are not frames.
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();

        if tokens.next()? != EMIT {
            return None;
        }
        let signal = tokens.next()?;

        Some(Self {
            signal: signal.to_string(),
            args: tokens.map(str::to_string).collect(),
        })
    }
}

use std::io::{BufRead, Write};

use crate::error::KiraError;

/// Line-oriented questions on any reader/writer pair.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Prints `question`, returns the answer without its line ending.
    /// End of input counts as a missing answer.
    pub fn ask(&mut self, question: &str, field: &'static str) -> Result<String, KiraError> {
        write!(self.output, "{question}").map_err(|err| KiraError::Io(err.to_string()))?;
        self.output
            .flush()
            .map_err(|err| KiraError::Io(err.to_string()))?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|err| KiraError::Io(err.to_string()))?;
        if read == 0 {
            return Err(KiraError::MissingInput(field));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

pub fn parse_bound(field: &'static str, raw: &str) -> Result<i64, KiraError> {
    raw.trim().parse::<i64>().map_err(|_| KiraError::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}

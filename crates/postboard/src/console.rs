//! Terminal input and output.

use std::{
    fmt::Display,
    io::{BufRead, Write},
};

use crate::CliError;

/// Line-oriented terminal.
///
/// Generic over its streams so commands can run against in-memory buffers.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    /// Console over the given streams.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// The output stream.
    pub fn output(&self) -> &W {
        &self.output
    }

    /// Write one line.
    pub fn line(&mut self, text: impl Display) -> Result<(), CliError> {
        writeln!(self.output, "{text}")?;
        Ok(())
    }

    /// Show `prompt` and read one line, without its line terminator.
    pub fn ask(&mut self, prompt: &str) -> Result<String, CliError> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            return Err(CliError::InputClosed);
        }
        let trimmed = answer.trim_end_matches(['\r', '\n']).len();
        answer.truncate(trimmed);
        Ok(answer)
    }

    /// Ask a yes/no question. Anything but `y` or `yes` means no.
    pub fn confirm(&mut self, question: &str) -> Result<bool, CliError> {
        let answer = self.ask(&format!("{question} [y/N] "))?;
        Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn console(input: &str) -> Console<&[u8], Vec<u8>> {
        Console::new(input.as_bytes(), Vec::new())
    }

    #[test]
    fn ask_strips_line_ending() {
        let mut c = console("hunter2\r\nnext\n");
        assert_eq!(c.ask("Password: ").unwrap(), "hunter2");
        assert_eq!(c.ask("Again: ").unwrap(), "next");
        assert_eq!(String::from_utf8_lossy(c.output()), "Password: Again: ");
    }

    #[test]
    fn confirm_defaults_to_no() {
        assert!(console("y\n").confirm("Sure?").unwrap());
        assert!(console(" YES \n").confirm("Sure?").unwrap());
        assert!(!console("\n").confirm("Sure?").unwrap());
        assert!(!console("nope\n").confirm("Sure?").unwrap());
    }

    #[test]
    fn closed_input_is_an_error() {
        assert!(matches!(console("").ask("> "), Err(CliError::InputClosed)));
    }
}

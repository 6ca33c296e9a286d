//! Asking the operator about tool calls.

use policy::Prompter;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};

/// Writes questions to `output` and reads one line of answer from `input`.
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R, W> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

/// Questions go to stderr. Answers come from the controlling terminal so
/// that stdin can carry the prompt variables; without a terminal, stdin.
pub fn terminal() -> LinePrompter<Box<dyn BufRead + Send>, io::Stderr> {
    let input: Box<dyn BufRead + Send> = match File::open("/dev/tty") {
        Ok(tty) => Box::new(BufReader::new(tty)),
        Err(_) => Box::new(BufReader::new(io::stdin())),
    };
    LinePrompter::new(input, io::stderr())
}

impl<R: BufRead + Send, W: Write + Send> Prompter for LinePrompter<R, W> {
    fn ask(&mut self, question: &str) -> io::Result<String> {
        self.output.write_all(question.as_bytes())?;
        self.output.flush()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            // EOF declines
            writeln!(self.output)?;
        }
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn writes_question_and_reads_one_line() {
        let mut prompter = LinePrompter::new(Cursor::new("y\nextra\n"), Vec::new());
        let answer = prompter.ask("Run this tool? [y/N] ").unwrap();
        assert_eq!(answer, "y\n");
        assert_eq!(prompter.output, b"Run this tool? [y/N] ");
    }

    #[test]
    fn eof_gives_empty_answer() {
        let mut prompter = LinePrompter::new(Cursor::new(""), Vec::new());
        assert_eq!(prompter.ask("Run this tool? [y/N] ").unwrap(), "");
        assert_eq!(prompter.output, b"Run this tool? [y/N] \n");
    }
}

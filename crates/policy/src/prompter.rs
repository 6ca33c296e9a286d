use std::io;

/// Asks the operator a question and returns the raw answer.
///
/// Implementations block until a line is available. End of input is an
/// empty answer, not an error.
pub trait Prompter: Send {
    fn ask(&mut self, question: &str) -> io::Result<String>;
}

impl<P: Prompter + ?Sized> Prompter for Box<P> {
    fn ask(&mut self, question: &str) -> io::Result<String> {
        (**self).ask(question)
    }
}

use std::cell::RefCell;
use std::rc::Rc;

use crate::interpreter::RuntimeInterrupt;
use crate::token::{Token, TokenType};

/// Diagnostic sink shared by the scanner, parser, resolver and
/// interpreter. The driver owns one per run and inspects the flags to
/// pick an exit code.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    pub had_error: bool,
    pub had_runtime_error: bool,
}

pub type SharedErrorReporter = Rc<RefCell<ErrorReporter>>;

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_shared(self) -> SharedErrorReporter {
        Rc::new(RefCell::new(self))
    }

    /// Report a static error with no lexeme context (scanner errors).
    pub fn error(&mut self, line: i32, message: &str) {
        self.report(line, "", message);
    }

    /// Report a static error at a token (parser and resolver errors).
    pub fn error_at(&mut self, token: &Token, message: &str) {
        if token.token_type == TokenType::EOF {
            self.report(token.line, " at end", message);
        } else {
            self.report(token.line, &format!(" at '{}'", token.lexeme), message);
        }
    }

    pub fn runtime_error(&mut self, interrupt: &RuntimeInterrupt) {
        eprintln!("{}", interrupt);
        self.had_runtime_error = true;
    }

    /// Clear the error flags. The REPL calls this between lines so one
    /// bad entry does not poison the session.
    pub fn reset(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }

    fn report(&mut self, line: i32, location: &str, message: &str) {
        eprintln!("[line {}] Error{}: {}", line, location, message);
        self.had_error = true;
    }
}

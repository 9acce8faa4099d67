#![allow(clippy::new_without_default)]
mod ast;
mod error;
mod interpreter;
mod object;
mod parser;
mod printer;
mod resolver;
mod scanner;
mod token;

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::error::*;
    pub use crate::interpreter::*;
    pub use crate::object::*;
    pub use crate::parser::*;
    pub use crate::printer::*;
    pub use crate::resolver::*;
    pub use crate::scanner::*;
    pub use crate::token::*;
}

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use log::debug;

use prelude::{ErrorReporter, Interpreter, Parser, Resolver, Scanner, SharedErrorReporter};

pub type Shared<T> = Rc<RefCell<T>>;

/// The driver: wires scanner, parser, resolver and interpreter around
/// one shared diagnostic sink. One instance per session; the REPL keeps
/// it alive so definitions persist across lines.
pub struct Lox {
    reporter: SharedErrorReporter,
    interpreter: Interpreter,
    next_node_id: usize,
}

impl Lox {
    pub fn new() -> Self {
        let reporter = ErrorReporter::new().as_shared();
        let interpreter = Interpreter::new().with_error_reporting(reporter.clone());
        Self { reporter, interpreter, next_node_id: 0 }
    }

    pub fn had_error(&self) -> bool {
        self.reporter.borrow().had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.reporter.borrow().had_runtime_error
    }

    pub fn run_file(&mut self, filename: &str) -> Result<(), anyhow::Error> {
        let content = std::fs::read_to_string(filename)?;
        self.run(content.as_ref());
        Ok(())
    }

    pub fn run_prompt(&mut self) -> Result<(), anyhow::Error> {
        let reader = std::io::stdin();

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let mut line = String::new();
            let n = reader.read_line(&mut line)?;
            if n == 0 {
                return Ok(());
            }

            self.run(line.trim_end());
            // A bad line shouldn't poison the rest of the session
            self.reporter.borrow_mut().reset();
        }
    }

    /// One-shot pipeline: source → tokens → AST → resolution → effects.
    /// Any static error suppresses the later stages; the caller reads
    /// the flags to pick an exit code.
    pub fn run(&mut self, source: &str) {
        let mut scanner = Scanner::new(source).with_error_reporting(self.reporter.clone());
        let tokens = scanner.scan_tokens();

        let mut parser = Parser::new(tokens)
            .with_error_reporting(self.reporter.clone())
            .with_first_node_id(self.next_node_id);
        let statements = parser.parse();
        self.next_node_id = parser.next_node_id();

        if self.had_error() {
            debug!("skipping resolution, scan or parse failed");
            return;
        }

        let mut resolver =
            Resolver::new(&mut self.interpreter).with_error_reporting(self.reporter.clone());
        resolver.resolve(&statements);

        if self.had_error() {
            debug!("skipping execution, resolution failed");
            return;
        }

        self.interpreter.interpret(&statements);
    }
}

use std::path::{Path, PathBuf};

use clap::{Parser as ClapParser, Subcommand};
use log::LevelFilter;
use simple_logger::SimpleLogger;

use loxwalk::prelude::*;
use loxwalk::Lox;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Script to execute; omit it for an interactive prompt
    filename: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the token stream of a script
    Tokenize { filename: PathBuf },

    /// Print the parsed syntax tree of a script
    Parse { filename: PathBuf },
}

fn main() -> Result<(), anyhow::Error> {
    SimpleLogger::new().with_level(LevelFilter::Warn).env().init()?;

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Tokenize { filename }) => tokenize(&filename),
        Some(Commands::Parse { filename }) => parse(&filename),
        None => match cli.filename {
            Some(filename) => run_file(&filename),
            None => Lox::new().run_prompt(),
        },
    }
}

fn run_file(filename: &Path) -> Result<(), anyhow::Error> {
    let mut lox = Lox::new();
    lox.run_file(&filename.to_string_lossy())?;

    if lox.had_error() {
        std::process::exit(65);
    }
    if lox.had_runtime_error() {
        std::process::exit(70);
    }

    Ok(())
}

fn tokenize(filename: &Path) -> Result<(), anyhow::Error> {
    let source = std::fs::read_to_string(filename)?;

    let reporter = ErrorReporter::new().as_shared();
    let mut scanner = Scanner::new(&source).with_error_reporting(reporter.clone());
    for token in scanner.scan_tokens() {
        println!("{token}");
    }

    if reporter.borrow().had_error {
        std::process::exit(65);
    }

    Ok(())
}

fn parse(filename: &Path) -> Result<(), anyhow::Error> {
    let source = std::fs::read_to_string(filename)?;

    let reporter = ErrorReporter::new().as_shared();
    let tokens = Scanner::new(&source).with_error_reporting(reporter.clone()).scan_tokens();
    let statements = Parser::new(tokens).with_error_reporting(reporter.clone()).parse();

    for stmt in &statements {
        println!("{}", AstPrinter::print_stmt(stmt));
    }

    if reporter.borrow().had_error {
        std::process::exit(65);
    }

    Ok(())
}

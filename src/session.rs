//! One interpreter session: scan → parse → resolve → execute.
//!
//! A [`Session`] owns a single [`Interpreter`], so globals (and the resolver's
//! distance table) persist across successive [`Session::run`] calls. That is
//! what lets a REPL define a function on one line and call it on the next.

use std::io::Write;

use log::{debug, info};
use thiserror::Error;

use crate::ast::Stmt;
use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;

/// Exit status for source that failed to scan, parse or resolve.
pub const EXIT_STATIC: i32 = 65;

/// Exit status for a program that aborted with a runtime error.
pub const EXIT_RUNTIME: i32 = 70;

/// Why a [`Session::run`] did not complete.
#[derive(Debug, Error)]
pub enum RunError {
    /// Lexical, parse or resolve diagnostics. Nothing was executed.
    #[error("{}", render(.0))]
    Static(Vec<LoxError>),

    /// Execution started and was aborted; earlier output stays written.
    #[error(transparent)]
    Runtime(LoxError),
}

impl RunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Static(_) => EXIT_STATIC,
            RunError::Runtime(_) => EXIT_RUNTIME,
        }
    }
}

fn render(errors: &[LoxError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<String>>()
        .join("\n")
}

pub struct Session {
    interpreter: Interpreter,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A session printing to stdout.
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
        }
    }

    /// A session whose `print` output goes to `output`.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        Self {
            interpreter: Interpreter::with_output(output),
        }
    }

    /// Run one execution unit (a whole file, or one REPL entry).
    pub fn run(&mut self, source: &str) -> Result<(), RunError> {
        let statements: Vec<Stmt> = parse_source(source)?;

        Resolver::new(&mut self.interpreter)
            .resolve(&statements)
            .map_err(RunError::Static)?;

        info!("Executing {} statement(s)", statements.len());

        self.interpreter.interpret(&statements).map_err(|e| {
            debug!("Runtime debug: {}", e);
            RunError::Runtime(e)
        })
    }
}

/// Scan and parse `source`, collecting lexical and syntax diagnostics together.
pub fn parse_source(source: &str) -> Result<Vec<Stmt>, RunError> {
    let (tokens, mut errors) = Scanner::new(source).scan_all();
    let (statements, parse_errors) = Parser::new(&tokens).parse();

    errors.extend(parse_errors);

    if errors.is_empty() {
        Ok(statements)
    } else {
        info!("Static check failed with {} diagnostic(s)", errors.len());
        Err(RunError::Static(errors))
    }
}

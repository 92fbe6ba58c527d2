use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use rustyline::error::ReadlineError;
use rustyline::Editor;

use innerlox::ast_printer::AstPrinter;
use innerlox::scanner::Scanner;
use innerlox::session::{self, Session, EXIT_STATIC};
use innerlox::token::Token;

const LOG_FILE: &str = "innerlox.log";
const HISTORY_FILE: &str = ".innerlox_history";

#[derive(ClapParser, Debug)]
#[command(version, about = "innerlox: a Lox interpreter with base-first method dispatch", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to innerlox.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print one JSON object per token instead of the plain form
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file and prints each statement's AST
    Parse { filename: PathBuf },

    /// Runs a Lox program from a file, or starts a REPL when none is given
    Run { filename: Option<PathBuf> },
}

/// Reads the contents of a file into a String
fn read_file(filename: PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf).context(format!("File {:?} is not valid UTF-8", filename))
}

fn init_logger() -> Result<()> {
    let log_file = File::create(LOG_FILE).context(format!("Failed to create {}", LOG_FILE))?;

    Builder::new()
        .format(|buf, record| {
            // Strip the crate prefix from the module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("innerlox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized, writing to {}", LOG_FILE);
    Ok(())
}

fn tokenize(filename: PathBuf, json: bool) -> Result<()> {
    info!("Running Tokenize subcommand");
    let source = read_file(filename)?;
    let mut tokenized = true;

    for token in Scanner::new(&source) {
        match token {
            Ok(token) => {
                debug!("Scanned token: {}", token);
                print_token(&token, json)?;
            }

            Err(e) => {
                tokenized = false;
                debug!("Tokenization debug: {}", e);
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code {}", EXIT_STATIC);
        std::process::exit(EXIT_STATIC);
    }

    info!("Tokenization completed successfully");
    Ok(())
}

fn print_token(token: &Token<'_>, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string(token).context("Failed to serialize token")?
        );
    } else {
        println!("{}", token);
    }
    Ok(())
}

fn parse(filename: PathBuf) -> Result<()> {
    info!("Running Parse subcommand");
    let source = read_file(filename)?;

    match session::parse_source(&source) {
        Ok(statements) => {
            for stmt in &statements {
                let ast_str = AstPrinter::print_stmt(stmt);
                debug!("AST: {}", ast_str);
                println!("{}", ast_str);
            }
        }

        Err(e) => {
            debug!("Parse debug: {}", e);
            eprintln!("{}", e);
            std::process::exit(e.exit_code());
        }
    }

    info!("Parse subcommand completed");
    Ok(())
}

fn run_file(filename: PathBuf) -> Result<()> {
    info!("Running Run subcommand");
    let source = read_file(filename)?;
    info!("Provided input:\n {}", source);

    let mut session = Session::new();

    if let Err(e) = session.run(&source) {
        debug!("Run debug: {}", e);
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }

    info!("Program executed successfully");
    Ok(())
}

fn run_prompt() -> Result<()> {
    info!("Starting REPL");
    let mut rl = Editor::<()>::new();
    if rl.load_history(HISTORY_FILE).is_err() {
        debug!("No previous history in {}", HISTORY_FILE);
    }

    let mut session = Session::new();

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                rl.add_history_entry(line.as_str());

                // Diagnostics are reported and the session carries on.
                if let Err(e) = session.run(&line) {
                    debug!("REPL entry failed with exit code {}", e.exit_code());
                    eprintln!("{}", e);
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err).context("Failed to read REPL input"),
        }
    }

    rl.save_history(HISTORY_FILE)
        .context(format!("Failed to save {}", HISTORY_FILE))?;

    info!("REPL finished");
    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        Builder::new().filter_level(log::LevelFilter::Off).init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => tokenize(filename, json),
        Commands::Parse { filename } => parse(filename),
        Commands::Run {
            filename: Some(filename),
        } => run_file(filename),
        Commands::Run { filename: None } => run_prompt(),
    }
}

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser};
use color_eyre::eyre::{eyre, Result, WrapErr};
use log::LevelFilter;
use ls8::machine::{Machine, INITIAL_SP};
use ls8::memory::parse;
use simple_logger::SimpleLogger;

/// Exit code for programs that could not be read or parsed
const LOAD_FAILURE: i32 = 2;

#[derive(Parser, Debug)]
#[command(version, about = "Runs a program on the LS-8 machine")]
struct Args {
    /// Initial value of the stack pointer (R7)
    #[arg(long, default_value_t = INITIAL_SP)]
    stack_pointer: u8,

    /// Log more, repeat for even more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Program file, one binary byte per line
    program: PathBuf,
}

fn level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    let args = Args::parse();
    SimpleLogger::new()
        .with_level(level(args.verbose))
        .init()
        .map_err(|err| eyre!("Failed to initialize logging: {}", err))?;

    let program = match parse::load_program(&args.program) {
        Ok(program) => program,
        Err(err) => {
            log::error!("{}: {}", args.program.display(), err);
            process::exit(LOAD_FAILURE);
        }
    };

    let mut machine = Machine::new().with_stack_pointer(args.stack_pointer);
    machine.load(&program)?;
    machine
        .run()
        .wrap_err_with(|| format!("Failed to run `{}`", args.program.display()))?;

    Ok(())
}

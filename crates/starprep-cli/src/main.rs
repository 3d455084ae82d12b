mod commands;
mod progress;
mod summary;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use starprep_core::config::{RunConfiguration, RunOptions};
use starprep_core::consts::MIN_SUPPLIED_OPTIONS;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const EXIT_SUCCESS: u8 = 0;
/// Run failed in the engine or on I/O.
const EXIT_FAILURE: u8 = 1;
/// Help was requested.
const EXIT_HELP: u8 = 2;
/// Too few options; the invocation is almost certainly a mistake.
const EXIT_MISUSE: u8 = 3;
/// An option was unknown or its value invalid, on the command line or in the
/// options file.
const EXIT_MALFORMED: u8 = 4;

#[derive(Parser, Debug)]
#[command(
    name = "starprep",
    about = "Build calibration masters, calibrate, register and stack astrophotography frames with Siril"
)]
#[command(version, disable_help_flag = true)]
struct Cli {
    /// Print help
    #[arg(short = 'h', long = "help")]
    help: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Print the effective run options as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Save the effective run options as TOML to this file and exit
    #[arg(long, value_name = "FILE")]
    write_config: Option<PathBuf>,

    #[command(flatten)]
    run: commands::pipeline::RunArgs,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(parse_error_code(err.kind()));
        }
    };

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    ExitCode::from(execute(&cli))
}

/// Exit code for a command line clap could not parse.
fn parse_error_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::DisplayVersion => EXIT_SUCCESS,
        ErrorKind::DisplayHelp => EXIT_HELP,
        _ => EXIT_MALFORMED,
    }
}

/// Carry out a parsed command line and return its exit code.
fn execute(cli: &Cli) -> u8 {
    if cli.help {
        print_usage();
        return EXIT_HELP;
    }

    let options = match cli.run.options() {
        Ok(options) => options,
        Err(err) => {
            eprintln!("Error: {err:#}");
            eprintln!("Run with --help for usage.");
            return EXIT_MALFORMED;
        }
    };

    match run(cli, &options) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            EXIT_FAILURE
        }
    }
}

fn run(cli: &Cli, options: &RunOptions) -> Result<u8> {
    if cli.print_config || cli.write_config.is_some() {
        commands::config::run(options, cli.write_config.as_deref())?;
        return Ok(EXIT_SUCCESS);
    }

    if options.supplied_count() < MIN_SUPPLIED_OPTIONS {
        print_usage();
        return Ok(EXIT_MISUSE);
    }

    let cwd = std::env::current_dir().context("Cannot determine the current directory")?;
    let config = match RunConfiguration::resolve(options, &cwd) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            eprintln!("Run with --help for usage.");
            return Ok(EXIT_MALFORMED);
        }
    };

    debug!(?config, "Resolved run configuration");
    let report = commands::pipeline::run(&cli.run, &config);
    Ok(if report.is_success() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    })
}

fn print_usage() {
    let mut cmd = Cli::command();
    let _ = cmd.print_help();
    println!();
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fdf_converter::{run, Mode};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Convert CSV client records to FDF form data
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the source CSV table
    table: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every client as JSON, newest first
    #[command(name = "list_clients")]
    ListClients,

    /// Write one client's FDF into a directory
    #[command(name = "convert_client")]
    ConvertClient {
        /// Directory the FDF file is written to
        output_dir: PathBuf,

        /// Row index of the client, as reported by list_clients
        #[arg(allow_hyphen_values = true)]
        client_index: String,
    },

    /// Convert every client and bundle the FDF files into a zip archive
    #[command(name = "convert_all_to_zip")]
    ConvertAllToZip {
        /// Scratch directory for the intermediate FDF files
        output_dir: PathBuf,

        /// Path of the zip archive to create
        output_zip_path: PathBuf,
    },

    /// Write an FDF template with one empty field per column
    #[command(name = "generate_empty_fdf")]
    GenerateEmptyFdf {
        /// Directory the template is written to
        output_dir: PathBuf,
    },

    /// Write every client's fields into a single FDF file
    #[command(name = "convert_all_to_fdf")]
    ConvertAllToFdf {
        /// Path of the FDF file to create
        output_fdf_path: PathBuf,
    },
}

impl From<Command> for Mode {
    fn from(command: Command) -> Self {
        match command {
            Command::ListClients => Mode::ListClients,
            Command::ConvertClient {
                output_dir,
                client_index,
            } => Mode::ConvertClient {
                output_dir,
                client_index,
            },
            Command::ConvertAllToZip {
                output_dir,
                output_zip_path,
            } => Mode::ConvertAllToZip {
                output_dir,
                output_zip_path,
            },
            Command::GenerateEmptyFdf { output_dir } => Mode::GenerateEmptyFdf { output_dir },
            Command::ConvertAllToFdf { output_fdf_path } => Mode::ConvertAllToFdf {
                output_path: output_fdf_path,
            },
        }
    }
}

fn init_logging() {
    // stdout carries the JSON payload, so logs go to stderr
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();
}

fn execute(args: Args) -> Result<String> {
    let mode = Mode::from(args.command);
    info!(table = %args.table.display(), "processing");

    let report = run(&args.table, &mode)
        .with_context(|| format!("Failed to process {}", args.table.display()))?;
    let payload = report.to_json().context("Failed to encode result")?;
    Ok(payload)
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // Help and version are printed to stdout and are not failures
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            return ExitCode::from(code);
        }
    };

    init_logging();

    match execute(args) {
        Ok(payload) => {
            println!("{}", payload);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

//! Stackfuzz CLI entrypoint.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use std::path::PathBuf;
use std::process::ExitCode;

use stackfuzz::{Library, Machine, MachineConfig, RunReport, RunStatus};

#[derive(Debug, Parser)]
#[command(name = "stackfuzz")]
#[command(about = "random stack-machine programs, failure search and minimization")]
struct Cli {
    /// Path to config file. Missing configs are treated as "defaults".
    #[arg(long, global = true, default_value = "stackfuzz.toml")]
    config: PathBuf,

    /// Log level.
    #[arg(long, global = true, default_value = "info")]
    log: String,

    /// Machine-readable output to stdout (JSON).
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search a stock library for a failing program and print it minimized
    Run {
        #[arg(long)]
        library: Library,

        #[arg(long)]
        seed: Option<u64>,

        /// Maximum number of programs to try.
        #[arg(long)]
        iters: Option<usize>,

        /// Maximum steps per program.
        #[arg(long)]
        length: Option<usize>,

        /// Stop once this many failing programs were seen.
        #[arg(long)]
        good_enough: Option<usize>,
    },

    /// Print version info
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_tracing(&cli.log) {
        eprintln!("warning: failed to init tracing: {err:#}");
    }

    let config = MachineConfig::load_optional(&cli.config);

    match run_command(&cli, config) {
        Ok(code) => code,
        Err(err) => print_error_and_exit(&cli, err),
    }
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))
}

fn run_command(cli: &Cli, mut config: MachineConfig) -> anyhow::Result<ExitCode> {
    match &cli.command {
        Command::Run {
            library,
            seed,
            iters,
            length,
            good_enough,
        } => {
            if let Some(seed) = seed {
                config.seed = Some(*seed);
            }
            if let Some(n) = iters {
                config.n_iters = *n;
            }
            if let Some(n) = length {
                config.prog_length = *n;
            }
            if let Some(n) = good_enough {
                config.good_enough = *n;
            }
            config.validate()?;

            let mut machine = Machine::new(config);
            library.install(&mut machine);
            let report = machine.run()?;
            print_run_report(cli, &report)?;
            Ok(exit_code_for_status(report.status))
        }

        Command::Version => {
            let info = serde_json::json!({
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            });
            print_json_or_text(cli, &info)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_run_report(cli: &Cli, report: &RunReport) -> anyhow::Result<()> {
    if cli.json {
        print_json_or_text(cli, report)?;
    } else {
        println!("{}", report.pretty());
    }
    Ok(())
}

fn print_json_or_text<T: serde::Serialize>(cli: &Cli, value: &T) -> anyhow::Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string(value)?);
    } else {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}

fn print_error_and_exit(cli: &Cli, err: anyhow::Error) -> ExitCode {
    let msg = format!("{err:#}");
    if cli.json {
        let out = serde_json::json!({
            "status": "error",
            "code": "error",
            "message": msg,
        });
        println!("{out}");
    } else {
        eprintln!("{msg}");
    }
    ExitCode::from(2)
}

fn exit_code_for_status(status: RunStatus) -> ExitCode {
    match status {
        RunStatus::Exhausted => ExitCode::SUCCESS,
        RunStatus::Fail => ExitCode::from(1),
    }
}

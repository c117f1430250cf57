//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvMarketDataAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{
    build_run_config, log_level, validate_market_data_config, RunOverrides, DEFAULT_LOG_LEVEL,
};
use crate::domain::context::{Context, TRADES_KEY};
use crate::domain::error::DslError;
use crate::domain::interpreter::Interpreter;
use crate::domain::strategy::Strategy;
use crate::domain::value::Value;
use crate::logging::init_logging;
use crate::ports::config_port::ConfigPort;

#[derive(Parser, Debug)]
#[command(name = "stratdsl", about = "Validate and run JSON trading strategy programs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check a program and list every defect
    Validate {
        #[arg(short, long)]
        program: PathBuf,
    },
    /// Validate, load market data and execute a program once
    Run {
        #[arg(short, long)]
        program: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        interval: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Validate { program } => run_validate(&program),
        Command::Run {
            program,
            config,
            symbol,
            interval,
            limit,
            data_dir,
        } => {
            let overrides = RunOverrides {
                data_dir,
                symbol,
                interval,
                limit,
            };
            run_program(&program, config.as_deref(), overrides)
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, DslError> {
    FileConfigAdapter::from_file(path).map_err(|reason| DslError::ConfigParse {
        file: path.display().to_string(),
        reason,
    })
}

fn run_validate(program: &Path) -> ExitCode {
    init_logging(DEFAULT_LOG_LEVEL);
    let strategy = match Strategy::from_file(program) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let report = strategy.validate();
    if report.is_valid() {
        println!("{}: valid", program.display());
        return ExitCode::SUCCESS;
    }
    for message in &report.errors {
        println!("{}", message);
    }
    let err = DslError::Validation {
        errors: report.errors,
    };
    eprintln!("error: {err}");
    (&err).into()
}

fn run_program(program: &Path, config_path: Option<&Path>, overrides: RunOverrides) -> ExitCode {
    let config = match config_path.map(load_config).transpose() {
        Ok(c) => c,
        Err(e) => {
            init_logging(DEFAULT_LOG_LEVEL);
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let config_port = config.as_ref().map(|c| c as &dyn ConfigPort);
    init_logging(&log_level(config_port));

    match execute(program, config_port, overrides) {
        Ok(context) => {
            match serde_json::to_string_pretty(&render_summary(&context)) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("error: failed to render result: {e}");
                    return ExitCode::from(1);
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            if let DslError::Validation { errors } = &e {
                for message in errors {
                    eprintln!("{}", message);
                }
            }
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Full pipeline: configure, compile, load market data, run once.
pub fn execute(
    program: &Path,
    config: Option<&dyn ConfigPort>,
    overrides: RunOverrides,
) -> Result<Context, DslError> {
    if let Some(config) = config {
        validate_market_data_config(config)?;
    }
    let run_config = build_run_config(config, overrides)?;
    let strategy = Strategy::from_file(program)?;
    let root = strategy.compile()?;

    let port = CsvMarketDataAdapter::new(&run_config.data_dir);
    let mut interpreter = Interpreter::new(root, Box::new(port));
    interpreter.load_market_data(&run_config.symbol, &run_config.interval, run_config.limit)?;
    interpreter.run()?;
    Ok(interpreter.context().clone())
}

/// Final state as JSON: scalar variables under `context`, the trade list
/// under `trades`. Market-data series are left out.
pub fn render_summary(context: &Context) -> serde_json::Value {
    let variables: serde_json::Map<String, serde_json::Value> = context
        .variables()
        .iter()
        .filter(|(name, value)| name.as_str() != TRADES_KEY && !matches!(value, Value::Series(_)))
        .map(|(name, value)| (name.clone(), serde_json::Value::from(value)))
        .collect();
    let trades: Vec<serde_json::Value> = context
        .trades()
        .iter()
        .map(serde_json::Value::from)
        .collect();
    serde_json::json!({
        "context": variables,
        "trades": trades,
    })
}

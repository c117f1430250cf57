//! CLI pipeline tests against real program, config and CSV files on disk.

mod common;

use common::*;
use std::path::PathBuf;
use std::process::ExitCode;
use stratdsl::adapters::file_config_adapter::FileConfigAdapter;
use stratdsl::cli::{self, Cli, Command};
use stratdsl::domain::config_validation::RunOverrides;
use stratdsl::domain::error::DslError;
use stratdsl::ports::config_port::ConfigPort;
use tempfile::TempDir;

const PROGRAM: &str = r#"{
  "name": "momentum",
  "instructions": [
    {"indicator": {"name": "SMA", "var": "sma_fast", "period": 3}},
    {"indicator": {"name": "EMA", "var": "ema_slow", "period": 10}},
    {"if": "sma_fast > ema_slow"},
    {"trade": {"action": "buy", "symbol": "BTCUSDT", "quantity": 0.25}},
    {"end": true}
  ]
}"#;

struct Fixture {
    dir: TempDir,
    program: PathBuf,
}

fn fixture(program: &str, bars: usize) -> Fixture {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "BTCUSDT_1h.csv", &csv_bars(bars, 100.0));
    let program = write_file(dir.path(), "program.json", program);
    Fixture { dir, program }
}

fn overrides(fx: &Fixture) -> RunOverrides {
    RunOverrides {
        data_dir: Some(fx.dir.path().to_path_buf()),
        symbol: Some("BTCUSDT".into()),
        ..RunOverrides::default()
    }
}

mod run_pipeline {
    use super::*;

    #[test]
    fn runs_from_overrides() {
        let fx = fixture(PROGRAM, 30);
        let ctx = cli::execute(&fx.program, None, overrides(&fx)).unwrap();
        assert_eq!(ctx.trades().len(), 1);

        let summary = cli::render_summary(&ctx);
        assert_eq!(summary["trades"][0]["action"], "buy");
        assert!(summary["context"].get("close").is_none());
        assert!(summary["context"]["sma_fast"].is_number());
    }

    #[test]
    fn runs_from_config_file() {
        let fx = fixture(PROGRAM, 30);
        let ini = format!(
            "[market_data]\ndata_dir = {}\nsymbol = BTCUSDT\ninterval = 1h\nlimit = 12\n",
            fx.dir.path().display()
        );
        let config = FileConfigAdapter::from_string(&ini).unwrap();
        let ctx = cli::execute(
            &fx.program,
            Some(&config as &dyn ConfigPort),
            RunOverrides::default(),
        )
        .unwrap();
        let close = ctx.series("close").unwrap();
        assert_eq!(close.len(), 12);
        assert_eq!(close.last().copied(), Some(129.0));
    }

    #[test]
    fn missing_csv_is_market_data_error() {
        let fx = fixture(PROGRAM, 30);
        let mut o = overrides(&fx);
        o.symbol = Some("ETHUSDT".into());
        let err = cli::execute(&fx.program, None, o).unwrap_err();
        assert!(matches!(err, DslError::MarketData { .. }));
        assert_eq!(ExitCode::from(&err), ExitCode::from(6));
    }

    #[test]
    fn invalid_program_is_validation_error() {
        let fx = fixture(r#"[{"if": "x > 0"}]"#, 5);
        let err = cli::execute(&fx.program, None, overrides(&fx)).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn malformed_program_file_is_program_load() {
        let fx = fixture("[{", 5);
        let err = cli::execute(&fx.program, None, overrides(&fx)).unwrap_err();
        assert!(matches!(err, DslError::ProgramLoad { .. }));
    }

    #[test]
    fn too_little_history_is_execution_error() {
        let fx = fixture(PROGRAM, 5);
        let err = cli::execute(&fx.program, None, overrides(&fx)).unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn bad_config_limit_rejected_before_loading() {
        let fx = fixture(PROGRAM, 30);
        let config = FileConfigAdapter::from_string("[market_data]\nsymbol = X\nlimit = -3\n").unwrap();
        let err = cli::execute(&fx.program, Some(&config as &dyn ConfigPort), RunOverrides::default())
            .unwrap_err();
        assert!(matches!(err, DslError::ConfigInvalid { .. }));
    }

    #[test]
    fn missing_symbol_rejected() {
        let fx = fixture(PROGRAM, 30);
        let err = cli::execute(&fx.program, None, RunOverrides::default()).unwrap_err();
        assert!(matches!(err, DslError::ConfigMissing { .. }));
    }
}

mod commands {
    use super::*;

    #[test]
    fn validate_command_exit_codes() {
        let fx = fixture(PROGRAM, 1);
        let ok = cli::run(Cli {
            command: Command::Validate {
                program: fx.program.clone(),
            },
        });
        assert_eq!(ok, ExitCode::SUCCESS);

        let bad = write_file(fx.dir.path(), "bad.json", r#"[{"end": true}]"#);
        let code = cli::run(Cli {
            command: Command::Validate { program: bad },
        });
        assert_eq!(code, ExitCode::from(3));
    }

    #[test]
    fn run_command_with_missing_config_file() {
        let fx = fixture(PROGRAM, 30);
        let code = cli::run(Cli {
            command: Command::Run {
                program: fx.program.clone(),
                config: Some(fx.dir.path().join("absent.ini")),
                symbol: None,
                interval: None,
                limit: None,
                data_dir: None,
            },
        });
        assert_eq!(code, ExitCode::from(2));
    }

    #[test]
    fn run_command_succeeds() {
        let fx = fixture(PROGRAM, 30);
        let code = cli::run(Cli {
            command: Command::Run {
                program: fx.program.clone(),
                config: None,
                symbol: Some("BTCUSDT".into()),
                interval: Some("1h".into()),
                limit: Some(20),
                data_dir: Some(fx.dir.path().to_path_buf()),
            },
        });
        assert_eq!(code, ExitCode::SUCCESS);
    }
}

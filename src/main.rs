use clap::Parser;
use stratdsl::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}

use clap::Parser;
use slot_optim::cli::{self, RestartCli};
use std::process::ExitCode;

fn main() -> ExitCode {
    cli::exit(cli::run_restart(RestartCli::parse()))
}

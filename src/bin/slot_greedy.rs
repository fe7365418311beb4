use clap::Parser;
use slot_optim::cli::{self, GreedyCli};
use std::process::ExitCode;

fn main() -> ExitCode {
    cli::exit(cli::run_greedy(GreedyCli::parse()))
}

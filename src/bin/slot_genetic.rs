use clap::Parser;
use slot_optim::cli::{self, GeneticCli};
use std::process::ExitCode;

fn main() -> ExitCode {
    cli::exit(cli::run_genetic(GeneticCli::parse()))
}

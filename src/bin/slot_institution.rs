use clap::Parser;
use slot_optim::cli::{self, InstitutionCli};
use std::process::ExitCode;

fn main() -> ExitCode {
    cli::exit(cli::run_institution(InstitutionCli::parse()))
}

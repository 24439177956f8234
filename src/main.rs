use clap::Parser;
use vppa::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}

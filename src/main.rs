mod cli;
mod core;
mod logging;
mod report;

use std::io::{Stderr, Stdout};

use clap::Parser;

use crate::cli::Cli;
use crate::core::error::ReencodeError;
use crate::core::options::{EncoderConfig, Options};
use crate::core::outcome::Outcome;
use crate::report::Reporter;

fn main() {
    let cli = Cli::parse();
    let options = cli.options();
    let config = cli.encoder_config();
    logging::init(options.verbosity);

    let mut reporter = Reporter::terminal(cli.color.enabled(), options.verbosity.is_quiet());

    match run(&options, &config, &mut reporter) {
        Ok(outcome) => reporter.outcome(&outcome),
        Err(err) => {
            reporter.failure(&options.source, &err);
            std::process::exit(err.exit_code());
        }
    }
}

fn run(
    options: &Options,
    config: &EncoderConfig,
    reporter: &mut Reporter<Stdout, Stderr>,
) -> Result<Outcome, ReencodeError> {
    let plan = crate::core::plan(options, config)?;
    reporter.announce(&plan);
    crate::core::run(&plan, config)
}

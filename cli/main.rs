// ========================================================================================
//
//                         The command-line front end: tally
//
// ========================================================================================
//
// Argument parsing, record loading, and the two-line report. All validation happens
// here, before the aggregation core is invoked: the worker count arrives as an
// explicit positive integer (never ambient state), and a bad record file aborts the
// run with no total printed.

#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

use clap::Parser;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process;

use tally::pipeline::aggregate;
use tally::source::{SourceError, load_records};

#[derive(Parser, Debug)]
#[clap(
    name = "tally",
    version,
    about = "A concurrent batch-aggregation engine for paired numeric records."
)]
struct Args {
    /// Number of worker threads. Defaults to the number of logical CPUs; the
    /// engine caps it at the record count.
    #[clap(value_name = "WORKERS")]
    workers: Option<NonZeroUsize>,

    /// Path to the record file: a JSON array of {"a": <int>, "b": <int>} objects.
    #[clap(long, value_name = "PATH", default_value = "data.json")]
    input: PathBuf,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), SourceError> {
    let requested_workers = args.workers.map_or_else(num_cpus::get, NonZeroUsize::get);
    let records = load_records(&args.input)?;

    let outcome = aggregate(&records, requested_workers);
    if !outcome.overflows.is_empty() {
        log::info!(
            "{} record pair(s) excluded by the overflow guard",
            outcome.overflows.len()
        );
    }

    println!("number of workers: {}", outcome.workers_used);
    println!("total sum: {}", outcome.total);
    Ok(())
}

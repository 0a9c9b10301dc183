//! Command-line level generator
//!
//! Seeds a session, generates one or more consecutive levels of a branch
//! and prints them as ASCII or JSON.

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::debug;
use strum::IntoEnumIterator;

use delve_core::dungeon::BranchId;
use delve_core::options::GenOptions;
use delve_core::{GenError, RngTraceEntry, Session};

/// Deterministic dungeon level generator
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(author, version, about = "Generate dungeon levels from a seed", long_about = None)]
struct Args {
    /// Random seed
    #[arg(short = 's', long = "seed", default_value_t = 42)]
    seed: u64,

    /// Branch name (main, mines, sokoban, quest, gehennom, planes)
    #[arg(short = 'b', long = "branch", default_value = "main")]
    branch: String,

    /// Depth within the branch
    #[arg(short = 'd', long = "depth", default_value_t = 1)]
    depth: i8,

    /// Number of consecutive levels to generate
    #[arg(short = 'n', long = "count", default_value_t = 1)]
    count: u8,

    /// Options file with OPTIONS= lines
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Print levels as JSON instead of ASCII
    #[arg(long = "json")]
    json: bool,

    /// Print the random draw trace of each level
    #[arg(long = "trace")]
    trace: bool,

    /// Register the built-in level scripts
    #[arg(long = "builtin")]
    builtin: bool,

    /// Show the resolved dungeon layout
    #[arg(long = "layout")]
    layout: bool,

    /// Write a session snapshot after generating
    #[arg(long = "snapshot")]
    snapshot: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("delve: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let options = match &args.config {
        Some(path) => GenOptions::load_from_file(path)?,
        None => GenOptions::default(),
    };
    let branch: BranchId = args
        .branch
        .parse()
        .map_err(|_| GenError::UnknownBranch(args.branch.clone()))?;

    let mut session = Session::new(args.seed, options)?;
    if args.builtin {
        session = session.with_builtin_levels()?;
    }
    if args.layout {
        print_layout(&session);
    }

    for offset in 0..args.count {
        let depth = level_depth(args.depth, offset)
            .ok_or_else(|| format!("depth {} + {offset} does not fit a level depth", args.depth))?;
        if args.trace {
            session.rng_mut().enable_tracing();
        }
        let level = session.generate_level(branch, depth)?;
        let trace = session.rng_mut().take_trace();
        session.rng_mut().disable_tracing();
        debug!("{}: {} trace entries", level.dlevel, trace.len());

        if args.json {
            println!("{}", serde_json::to_string_pretty(&level)?);
        } else {
            println!("{}", level.dlevel);
            print!("{}", level.render());
        }
        if args.trace {
            print_trace(&trace, args.json)?;
        }
    }

    if let Some(path) = &args.snapshot {
        session.snapshot().save(path)?;
    }
    Ok(())
}

/// Depth of the `offset`-th generated level, if it is representable
fn level_depth(start: i8, offset: u8) -> Option<i8> {
    i8::try_from(offset).ok().and_then(|o| start.checked_add(o))
}

fn print_layout(session: &Session) {
    let topology = session.topology();
    for id in BranchId::iter() {
        let Some(branch) = topology.branch(id) else {
            continue;
        };
        match branch.attachment {
            Some(parent) => println!(
                "{id}: {} levels, {} from {parent}",
                branch.num_levels, branch.link
            ),
            None => println!("{id}: {} levels", branch.num_levels),
        }
    }
}

fn print_trace(trace: &[RngTraceEntry], json: bool) -> Result<(), serde_json::Error> {
    for entry in trace {
        if json {
            println!("{}", serde_json::to_string(entry)?);
        } else {
            println!(
                "{:>6} {}({}) = {}",
                entry.seq, entry.func, entry.arg, entry.result
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_depth_does_not_wrap() {
        assert_eq!(level_depth(1, 0), Some(1));
        assert_eq!(level_depth(5, 3), Some(8));
        assert_eq!(level_depth(1, 200), None);
        assert_eq!(level_depth(120, 10), None);
    }
}

use std::io;

use clap::Parser;

use dnsguard::cli::{Cli, Command};
use dnsguard::error::GuardError;
use dnsguard::output;
use dnsguard::replay::{self, ReplayRecord, ReplayStats};

/// Exit codes: 2 for an unreadable capture, 3 for a malformed or
/// unsupported one, 4 for everything else.
fn exit_code(err: &GuardError) -> i32 {
    match err {
        GuardError::Io(_) => 2,
        GuardError::CaptureFormat { .. } | GuardError::UnsupportedLinkType(_) => 3,
        _ => 4,
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(exit_code(&e));
        }
    }
}

fn run(cli: Cli) -> Result<(), GuardError> {
    match cli.command {
        Command::Replay(args) => {
            let policy = args.policy.policy()?;
            let mut records = replay::replay_file(&args.capture, &policy)?;
            if args.discarded_only {
                records.retain(|r: &ReplayRecord| r.disposition.is_discard());
            }
            let stdout = io::stdout();
            let mut out = stdout.lock();
            output::write_verdicts(&records, args.format, &mut out)
        }
        Command::Stats(args) => {
            let policy = args.policy.policy()?;
            let records = replay::replay_file(&args.capture, &policy)?;
            let stats = ReplayStats::from_records(&records);
            log::info!(
                "{} of {} frames would be discarded",
                stats.discarded,
                stats.frames
            );
            let stdout = io::stdout();
            let mut out = stdout.lock();
            output::write_stats(&stats, args.format, &mut out)
        }
    }
}

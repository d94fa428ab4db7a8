mod cli;

use clap::error::ErrorKind;
use clap::Parser;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use cli::Args;
use followname::error::{FollowError, EXIT_ERROR, EXIT_SUCCESS};
use followname::Follower;

/// Diagnostics go to stderr; stdout carries only the followed lines
fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Print lines until interrupted
///
/// The wait between empty polls doubles as the wait for an interrupt, so
/// Ctrl-C is noticed without waiting out the interval.
fn pump(
    follower: &mut Follower,
    interval: Duration,
    stop: &Receiver<()>,
) -> Result<(), FollowError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    loop {
        match follower.poll_line()? {
            Some(line) => {
                if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
                    if e.kind() == io::ErrorKind::BrokenPipe {
                        return Ok(());
                    }
                    return Err(FollowError::io(e, "<stdout>"));
                }
                if stop.try_recv().is_ok() {
                    return Ok(());
                }
            }
            None => match stop.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => return Ok(()),
            },
        }
    }
}

fn run(args: Args) -> Result<(), FollowError> {
    let interval = args.interval()?;

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })?;

    let mut follower = Follower::new(&args.file, args.follow_options());
    tracing::debug!(path = %args.file.display(), ?interval, "following");

    let result = pump(&mut follower, interval, &rx);
    follower.close();
    result
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.kind() == ErrorKind::MissingRequiredArgument => {
            let _ = e.print();
            return ExitCode::from(EXIT_ERROR as u8);
        }
        Err(e) => e.exit(),
    };
    init_logging(args.debug);

    match run(args) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS as u8),
        Err(e) => {
            eprintln!("followname: {}", e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

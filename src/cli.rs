use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use followname::{FollowError, FollowOptions};

/// followname - follow a file by name, surviving rotation and truncation
#[derive(Parser, Debug)]
#[command(name = "followname")]
#[command(version)]
#[command(about = "Print lines appended to a file, like tail --follow=name")]
#[command(long_about = None)]
pub struct Args {
    /// File to follow (may not exist yet)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Display all data in file when started, default is new data only
    #[arg(short = 'a', long = "all")]
    pub all: bool,

    /// Display all data in file when started, default is new data only
    #[arg(short = 'e', long = "end")]
    pub end: bool,

    /// Sleep for approximately S seconds between iterations
    #[arg(short = 's', long = "sleep-interval", value_name = "S", default_value = "1.0")]
    pub sleep_interval: f64,

    /// Output appended data as the file grows (always on)
    #[arg(short = 'f', long = "follow")]
    pub follow: bool,

    /// Print diagnostic notices to stderr
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,
}

impl Args {
    /// `--all` and `--end` both ask for the existing content
    pub fn replay_from_start(&self) -> bool {
        self.all || self.end
    }

    /// Poll interval from `--sleep-interval`
    pub fn interval(&self) -> Result<Duration, FollowError> {
        Duration::try_from_secs_f64(self.sleep_interval).map_err(|_| {
            FollowError::InvalidInterval {
                value: self.sleep_interval,
            }
        })
    }

    pub fn follow_options(&self) -> FollowOptions {
        FollowOptions {
            replay_from_start: self.replay_from_start(),
            debug: self.debug,
            ..FollowOptions::default()
        }
    }
}

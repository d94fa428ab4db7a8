//! Follow a file by name, like `tail --follow=name`.
//!
//! A [`Follower`] is bound to a path and yields complete lines as they are
//! appended. When the path starts naming a different file (rotation) or the
//! file shrinks (truncation), the path is re-opened and read from the start.
//! Polling is the only wakeup mechanism.
//!
//! ```no_run
//! use std::time::Duration;
//! use followname::{FollowOptions, Follower};
//!
//! let mut follower = Follower::new("/var/log/syslog", FollowOptions::default());
//! for line in follower.follow(Duration::from_secs(1)) {
//!     println!("{}", line?);
//! }
//! # Ok::<(), followname::FollowError>(())
//! ```

pub mod error;
pub mod input;

pub use error::FollowError;
pub use input::{FileId, Follow, FollowOptions, FollowState, Follower, Terminators};

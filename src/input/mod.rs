mod encoding;
mod follow;
mod identity;
mod terminator;

pub use encoding::{decode_line, strip_bom};
pub use follow::{Follow, FollowOptions, FollowState, Follower, DEFAULT_READ_SIZE};
pub use identity::{FileId, Snapshot};
pub use terminator::{LineSplitter, Terminators};

//! Re-exports of the shared utility functions and structures from
//! [`pocketgb_common::util`], kept as a local module so call sites inside
//! this crate read as `crate::util::*` like the rest of the codebase.

pub use pocketgb_common::util::{capitalize, read_file, replace_ext, timestamp, write_file, SharedMut, SharedThread};

//! Compile-time build information, regenerated by `build.rs` on every build.
//!
//! The checked-in `build.rs` file here is a placeholder with plausible
//! values so the crate type-checks before the build script has run once;
//! `build.rs` (the crate root one, not this file) truncates and rewrites it.

#[path = "build.rs"]
mod generated;

pub use generated::*;

//! Global constants, such as compiler version used, features, platform
//! information and others.
//!
//! Placeholder values, overwritten by `build.rs` on every build.

pub const COMPILATION_DATE: &str = "UNKNOWN";
pub const COMPILATION_TIME: &str = "UNKNOWN";
pub const NAME: &str = "pocketgb";
pub const VERSION: &str = "0.1.0";
pub const COMPILER: &str = "rustc";
pub const COMPILER_VERSION: &str = "UNKNOWN";
pub const HOST: &str = "UNKNOWN";
pub const TARGET: &str = "UNKNOWN";
pub const PROFILE: &str = "UNKNOWN";
pub const OPT_LEVEL: &str = "UNKNOWN";
pub const FEATURES_SEQ: [&str; 1] = ["cpu"];
pub const PLATFORM_CPU_BITS: &str = "64";

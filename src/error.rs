//! Error related data structures, re-exported from [`pocketgb_common::error`]
//! so call sites inside this crate read as `crate::error::Error`.

pub use pocketgb_common::error::Error;

//! Performance profiling helpers.
//!
//! `#[profile]` only emits timing code when the `perf_stats` feature is enabled.

pub use tilewalk_macros::profile;

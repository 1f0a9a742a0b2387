// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All runtime environment variables read by the CLI are defined here
//! with typed accessor functions.

use std::path::PathBuf;

/// Environment variable names.
pub mod vars {
    pub const INLINE_REALTIME_URL: &str = "INLINE_REALTIME_URL";
    pub const INLINE_DATA_DIR: &str = "INLINE_DATA_DIR";
    pub const INLINE_TOKEN: &str = "INLINE_TOKEN";
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Returns `INLINE_REALTIME_URL` if set and non-empty.
pub fn realtime_url() -> Option<String> {
    non_empty(vars::INLINE_REALTIME_URL)
}

/// Returns `INLINE_DATA_DIR` if set and non-empty.
pub fn data_dir() -> Option<PathBuf> {
    non_empty(vars::INLINE_DATA_DIR).map(PathBuf::from)
}

/// Returns `INLINE_TOKEN` if set and non-empty.
pub fn token() -> Option<String> {
    non_empty(vars::INLINE_TOKEN)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;

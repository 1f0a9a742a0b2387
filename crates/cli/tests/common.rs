// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// `inl` with a private data dir and no inherited `INLINE_*` settings.
pub fn inl(data_dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("inl");
    cmd.arg("--data-dir")
        .arg(data_dir.path())
        .env_remove("INLINE_REALTIME_URL")
        .env_remove("INLINE_DATA_DIR")
        .env_remove("INLINE_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

/// Writes `config.toml` into the data dir.
pub fn write_config(data_dir: &TempDir, content: &str) {
    std::fs::write(data_dir.path().join("config.toml"), content).unwrap();
}

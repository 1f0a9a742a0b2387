// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use std::path::PathBuf;

use super::*;

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(args)
}

#[test]
fn test_global_defaults() {
    let cli = parse(&["inl", "chats"]).unwrap();
    assert_eq!(cli.data_dir, None);
    assert!(!cli.verbose);
    assert_eq!(cli.log_file, None);
    assert_eq!(cli.timeout, 30);
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = parse(&[
        "inl",
        "send",
        "1",
        "hi",
        "--data-dir",
        "/tmp/inl",
        "-v",
        "--timeout",
        "5",
        "--log-file",
        "/tmp/inl.log",
    ])
    .unwrap();
    assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/inl")));
    assert!(cli.verbose);
    assert_eq!(cli.timeout, 5);
    assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/inl.log")));
}

/// Only these short flags exist.
#[test]
fn test_flag_consistency() {
    use clap::CommandFactory;

    let allowed: std::collections::HashMap<char, &str> =
        [('v', "verbose"), ('n', "limit")].into_iter().collect();

    let cmd = Cli::command();
    let mut seen = std::collections::HashSet::new();
    let mut check = |c: &clap::Command| {
        for arg in c.get_arguments() {
            if let Some(short) = arg.get_short() {
                if short == 'h' || short == 'V' {
                    continue;
                }
                let long = arg.get_long().unwrap();
                assert_eq!(allowed.get(&short), Some(&long), "unexpected -{}", short);
                seen.insert(short);
            }
        }
    };
    check(&cmd);
    for sub in cmd.get_subcommands() {
        check(sub);
    }
    assert_eq!(seen.len(), allowed.len());
}

#[test]
fn test_unknown_command_fails() {
    assert!(parse(&["inl", "frobnicate"]).is_err());
}

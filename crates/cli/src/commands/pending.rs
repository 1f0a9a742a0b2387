// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use crate::config::journal_path;
use crate::display::format_pending;
use crate::error::Result;
use crate::sync::JournalStore;

use super::Context;

/// Lists durable transactions persisted by earlier runs. Never connects.
pub fn run(ctx: &Context) -> Result<()> {
    let journal = JournalStore::new(journal_path(&ctx.data_dir));
    run_impl(&journal)
}

pub(crate) fn run_impl(journal: &JournalStore) -> Result<()> {
    let records = journal.replay()?;
    if records.is_empty() {
        println!("No pending transactions");
        return Ok(());
    }
    for record in &records {
        println!("{}", format_pending(record));
    }
    Ok(())
}

#[cfg(test)]
#[path = "pending_tests.rs"]
mod tests;

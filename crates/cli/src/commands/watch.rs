// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::future::Future;

use tokio::sync::broadcast::error::RecvError;

use crate::display::{format_state, format_update};
use crate::error::Result;
use crate::sync::SyncEngine;

use super::{open_engine, Context};

/// Stays connected until Ctrl-C.
pub async fn run(ctx: &Context) -> Result<()> {
    let engine = open_engine(ctx)?;
    let result = run_impl(&engine, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    })
    .await;
    engine.shutdown().await;
    result
}

/// Internal implementation that accepts an engine and a stop signal for testing.
pub(crate) async fn run_impl(engine: &SyncEngine, until: impl Future<Output = ()>) -> Result<()> {
    let mut states = engine.subscribe();
    let mut updates = engine.subscribe_updates();
    engine.start();
    println!("{}", format_state(*states.borrow_and_update()));

    tokio::pin!(until);
    loop {
        tokio::select! {
            _ = &mut until => break,
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("{}", format_state(*states.borrow_and_update()));
            }
            batch = updates.recv() => match batch {
                Ok(batch) => {
                    for update in &batch {
                        println!("{}", format_update(update));
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "watch output fell behind");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    let counts = engine.queue_counts();
    if counts.total() > 0 {
        println!("{} transaction(s) still pending", counts.total());
    }
    Ok(())
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;

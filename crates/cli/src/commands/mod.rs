// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod chats;
pub mod dialogs;
pub mod messages;
pub mod pending;
pub mod reactions;
#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use inl_core::Database;

use crate::config::{journal_path, resolve_data_dir, store_path, Config};
use crate::error::{Error, Result};
use crate::ops::Operation;
use crate::sync::{JournalStore, SyncEngine, WebSocketFactory};

/// Everything a command needs from the environment.
pub struct Context {
    pub data_dir: PathBuf,
    pub config: Config,
    /// Max wait for a network outcome.
    pub timeout: Duration,
}

impl Context {
    pub fn load(data_dir: Option<&Path>, timeout_secs: u64) -> Result<Self> {
        let data_dir = resolve_data_dir(data_dir)?;
        let config = Config::load(&data_dir)?;
        Ok(Context {
            data_dir,
            config,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Helper to open the local store, creating the data directory if needed.
pub fn open_store(data_dir: &Path) -> Result<Arc<Database>> {
    std::fs::create_dir_all(data_dir)?;
    let db = Database::open(&store_path(data_dir))?;
    Ok(Arc::new(db))
}

/// Opens the engine over the realtime WebSocket with the on-disk journal.
///
/// Persisted work from earlier runs is restored; the engine is not
/// started yet.
pub fn open_engine(ctx: &Context) -> Result<SyncEngine> {
    ctx.config.require_token()?;
    let store = open_store(&ctx.data_dir)?;
    let journal = JournalStore::new(journal_path(&ctx.data_dir));
    let engine = SyncEngine::open(
        ctx.config.engine(),
        Arc::new(WebSocketFactory),
        store,
        Box::new(journal),
    )?;
    Ok(engine)
}

/// Submits an operation and waits at most `timeout` for its outcome.
///
/// On timeout the operation stays in the queue; the caller's shutdown
/// flushes durable work to the journal.
pub(crate) async fn submit_and_wait(
    engine: &SyncEngine,
    operation: impl Into<Operation>,
    timeout: Duration,
) -> Result<serde_json::Value> {
    match tokio::time::timeout(timeout, engine.submit(operation)).await {
        Ok(outcome) => Ok(outcome?),
        Err(_) => {
            tracing::warn!(timeout_secs = timeout.as_secs(), "no outcome before timeout");
            Err(Error::Timeout(timeout.as_secs()))
        }
    }
}

/// Runs `f` against a started engine, then shuts the engine down.
macro_rules! with_engine {
    ($ctx:expr, |$engine:ident| $body:expr) => {{
        let $engine = $crate::commands::open_engine($ctx)?;
        $engine.start();
        let result = $body.await;
        $engine.shutdown().await;
        result
    }};
}
pub(crate) use with_engine;

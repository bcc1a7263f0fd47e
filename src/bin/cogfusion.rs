//! cogfusion line analyser.
//!
//! Reads one input per line from stdin, runs the controller on it and prints
//! the resulting turn signals as one JSON object per line.
//!
//! # Environment Variables
//!
//! - `COGFUSION_CONFIG` - YAML or JSON config file (default: built-in defaults)
//! - `COGFUSION_DB` - SQLite file long-term memory is restored from at start-up
//!   and persisted to once stdin is exhausted (optional)
//! - `RUST_LOG` - log filter (default: "info")
//!
//! # Usage
//!
//! ```bash
//! echo "Why do tides happen?" | cargo run --bin cogfusion
//! ```

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use cogfusion::{
    ControllerConfig, HashingEmbedder, LtmSqliteStorage, MagnitudeScorer, Session, VERSION,
};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::var("COGFUSION_CONFIG") {
        Ok(path) => {
            log::info!("loading config from {}", path);
            ControllerConfig::from_path(&path)?
        }
        Err(_) => ControllerConfig::default(),
    };

    let mut session = Session::new(
        "stdin",
        config,
        Arc::new(HashingEmbedder::default()),
        Arc::new(MagnitudeScorer),
    )?;

    let storage = match std::env::var("COGFUSION_DB") {
        Ok(db_path) => {
            let storage = LtmSqliteStorage::new(&db_path, true)?;
            let restored = session.memory_mut().restore_from(&storage)?;
            log::info!("restored {} experiences from {}", restored, db_path);
            Some(storage)
        }
        Err(_) => None,
    };

    log::info!("cogfusion {} reading from stdin", VERSION);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let analysed = analyse_lines(&mut session, io::stdin().lock(), &mut out)?;
    log::info!("analysed {} inputs", analysed);

    persist(&session, storage.as_ref())?;
    Ok(())
}

/// Analyse each non-blank line of `input`, writing one JSON object per line.
fn analyse_lines<R: BufRead, W: Write>(
    session: &mut Session,
    input: R,
    out: &mut W,
) -> anyhow::Result<usize> {
    let mut analysed = 0;
    for line in input.lines() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        let signals = session.analyze(text)?;
        serde_json::to_writer(&mut *out, &signals)?;
        writeln!(out)?;
        analysed += 1;
    }
    Ok(analysed)
}

fn persist(session: &Session, storage: Option<&LtmSqliteStorage>) -> anyhow::Result<()> {
    if let Some(storage) = storage {
        let written = session.memory().persist_to(storage)?;
        log::info!(
            "persisted {} experiences to {}",
            written,
            storage.db_path.display()
        );
    }
    Ok(())
}

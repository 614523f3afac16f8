//! `pane get` / `pane set`: inspect an app's keyspace on this device.

use anyhow::{Context, Result};

use pane_client::{EngineConfig, StorageKeyspace};

pub fn run_get(engine: &EngineConfig, app: &str, key: &str) -> Result<()> {
    let value = StorageKeyspace::new(&engine.storage_root)
        .get(&engine.user, app, key)
        .with_context(|| format!("failed to read {app}/{key}"))?;
    println!("{value}");
    Ok(())
}

pub fn run_set(engine: &EngineConfig, app: &str, key: &str, value: &str) -> Result<()> {
    StorageKeyspace::new(&engine.storage_root)
        .set(&engine.user, app, key, value)
        .with_context(|| format!("failed to write {app}/{key}"))?;
    Ok(())
}

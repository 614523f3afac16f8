//! `pane apps`: print the recent apps list.

use anyhow::{Context, Result};

use pane_client::{EngineConfig, RecentAppsRegistry, StorageKeyspace};

pub fn run(engine: &EngineConfig) -> Result<()> {
    let registry = RecentAppsRegistry::new(
        StorageKeyspace::new(&engine.storage_root),
        engine.default_endpoint.clone(),
    );
    let apps = registry
        .list(&engine.user)
        .with_context(|| format!("failed to read recent apps for '{}'", engine.user))?;

    // Index 0 is the add-endpoint marker.
    for (i, app) in apps.iter().enumerate().skip(1) {
        println!("{i:>3}  {app}");
    }
    Ok(())
}

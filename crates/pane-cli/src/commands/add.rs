//! `pane add <ENDPOINT>`: probe an endpoint and remember it.

use anyhow::{Context, Result};
use tracing::info;

use pane_client::{connect_bounded, EngineConfig, RecentAppsRegistry, StorageKeyspace, TcpConnector};
use pane_core::transport::Transport;
use pane_core::Endpoint;

pub async fn run(engine: &EngineConfig, raw: &str) -> Result<()> {
    let raw = raw.trim();
    let endpoint = Endpoint::parse_with_default(raw, engine.default_port)?;

    let mut probe = connect_bounded(&TcpConnector, &endpoint, engine.connect_timeout)
        .await
        .with_context(|| format!("cannot reach {endpoint}"))?;
    probe.close().await.context("failed to close probe connection")?;

    RecentAppsRegistry::new(
        StorageKeyspace::new(&engine.storage_root),
        engine.default_endpoint.clone(),
    )
    .add(&engine.user, raw)
    .context("failed to update recent apps")?;

    info!(%endpoint, "endpoint added");
    println!("added {raw}");
    Ok(())
}

//! `statesandbox serve`

use anyhow::Result;

use statesandbox::config::SandboxConfig;

pub async fn cmd_serve(
    mut config: SandboxConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    if let Some(host) = host {
        config.toml.server.host = host;
    }
    if let Some(port) = port {
        config.toml.server.port = port;
    }
    for warning in config.toml.validate() {
        tracing::warn!("config: {}", warning);
    }
    statesandbox::server::start_server(config).await
}

//! Example demonstrating polling change detection and change tracking.
//!
//! This example shows how to:
//! - Register a configuration file with a registry
//! - Monitor it for changes and receive change events
//! - Inspect the field-level change log
//! - Persist an update through the registry
//!
//! Run with: cargo run --example poll_reload
//!
//! While running, try editing the printed file path to see reloads.
//! Set `RUST_LOG=confmon=debug` to see every poll tick.

use confmon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AppConfig {
    server: ServerConfig,
    database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServerConfig {
    port: u16,
    host: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DatabaseConfig {
    url: String,
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("confmon=info")),
        )
        .init();

    println!("=== Poll Reload Example ===\n");

    let dir = std::env::temp_dir().join("confmon-demo");
    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::Other(e.to_string()))?;
    let path = dir.join("app.yaml");
    if !path.exists() {
        std::fs::write(
            &path,
            r#"server:
  port: 8080
  host: localhost

database:
  url: postgres://localhost/mydb
  max_connections: 10
"#,
        )
        .map_err(|e| ConfigError::Other(e.to_string()))?;
    }
    println!("Watching {}", path.display());

    let registry = ConfigRegistry::builder()
        .with_poll_interval(Duration::from_millis(500))
        .with_change_tracking(true)
        .build();
    let config = registry.add_config_file::<AppConfig>(&dir, "app.yaml").await?;
    registry.start_monitoring("app").await?;

    let initial = config.get();
    println!("Initial configuration:");
    println!("  Server: {}:{}", initial.server.host, initial.server.port);
    println!("  Database: {}", initial.database.url);
    println!("  Max connections: {}\n", initial.database.max_connections);

    let _subscription = registry.subscribe("app", |event| {
        println!(
            "\n>>> {} reloaded ({:?}, {} field change(s))",
            event.config_name, event.origin, event.changes
        );
    })?;

    // Simulate an operator raising the connection limit
    let mut updated = (*config.get()).clone();
    updated.database.max_connections += 5;
    registry.update_config("app", &updated).await?;

    let mut events = registry.changes_channel("app")?;
    println!("Edit the file within 30 seconds to see more reloads...");
    let deadline = tokio::time::sleep(Duration::from_secs(30));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            event = events.recv() => match event {
                Ok(_) => {
                    let current = config.get();
                    println!("    port={} max_connections={}",
                        current.server.port, current.database.max_connections);
                }
                Err(e) => {
                    println!("Change channel closed: {}", e);
                    break;
                }
            },
        }
    }

    println!("\nChange log:");
    for record in registry.changes("app") {
        println!(
            "  [{}] {:?} {}: {:?} -> {:?}",
            record.timestamp().format("%H:%M:%S"),
            record.kind(),
            record.field(),
            record.old_value(),
            record.new_value()
        );
    }

    registry.shutdown().await;
    Ok(())
}

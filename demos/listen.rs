//! Listener - connect to a notification server and print what it pushes.
//!
//! This example demonstrates:
//! - Building a client from a JSON config file or command-line arguments
//! - Handling notifications with a closure
//! - Issuing an RPC call once the session is up
//!
//! # Running
//!
//! ```sh
//! RUST_LOG=notifywire_client=debug cargo run --example listen -- notify.example.com 4443
//! cargo run --example listen -- --config client.json
//! ```

use std::time::Duration;

use notifywire_client::{Client, ClientBuilder, ClientConfig, Notification};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Shape of the `release` notifications the demo server sends.
#[derive(Deserialize, Debug)]
struct Release {
    name: String,
    #[serde(default)]
    url: Option<String>,
}

fn builder_from_args() -> Result<ClientBuilder, Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.as_slice() {
        [flag, path] if flag == "--config" => {
            let raw = std::fs::read(path)?;
            Ok(ClientBuilder::from_config(ClientConfig::from_json(&raw)?))
        }
        [address, port] => Ok(Client::builder(address.clone(), port.parse()?)),
        _ => Err("usage: listen <address> <port> | listen --config <file>".into()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let client = builder_from_args()?
        .on_notification(|notification: Notification| match notification.kind() {
            Some("release") => match notification.decode::<Release>() {
                Ok(release) => println!("release {} {}", release.name, release.url.unwrap_or_default()),
                Err(e) => eprintln!("bad release notification: {e}"),
            },
            _ => println!("{}", notification.into_value()),
        })
        .build()?;

    let worker = tokio::spawn({
        let client = client.clone();
        async move { client.run().await }
    });

    // Give the first session a moment, then ask for recent releases
    tokio::time::sleep(Duration::from_secs(2)).await;
    match client.call("getReleases", &[5]).await {
        Ok(result) => println!("recent releases: {}", result.result),
        Err(e) => eprintln!("getReleases failed: {e}"),
    }

    tokio::signal::ctrl_c().await?;
    client.shutdown();
    worker.await?;

    Ok(())
}

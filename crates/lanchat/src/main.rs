//! LAN chat application entry point.
//!
//! Wires the multicast transport to the terminal: inbound messages are
//! printed by the delivery callback, typed lines flow out through the
//! blocking input loop, and teardown (exit command or Ctrl-C) announces the
//! departure before shutting the transport down.
//!
//! ```text
//! main()
//!  └─ load_config()           -- TOML config with reference defaults
//!  └─ MulticastTransport::new -- bind socket, join group
//!  └─ start(print callback)   -- background receive thread
//!  └─ send(Join)
//!  └─ input loop thread       -- stdin lines -> Chat messages
//!  └─ on exit / Ctrl-C        -- send(Leave), shutdown()
//! ```

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lanchat::{cli, config};
use lanchat::network::MulticastTransport;
use lanchat_core::{ChatMessage, MessageKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let username = parse_username()?;

    // Tracing is not up yet, so a broken config file goes to stderr directly.
    let config = match config::load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("warning: failed to load config, using defaults: {e}");
            config::AppConfig::default()
        }
    };

    // Structured logging; level overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.chat.log_level)),
        )
        .init();

    let transport = Arc::new(
        MulticastTransport::new(&config.network)
            .context("failed to initialize multicast transport")?,
    );
    info!(
        "joined chat group {} on port {} as {username:?}",
        transport.group(),
        transport.port()
    );

    // Delivery callback: runs on the receive thread, so it only prints.
    // Loopback delivers our own datagrams too; filter them here.
    let own_name = username.clone();
    transport
        .start(move |message| {
            if message.sender() == own_name {
                return;
            }
            match message.kind() {
                MessageKind::Chat => println!("[{}] {}", message.sender(), message.text()),
                MessageKind::Join => println!("*** {} joined the chat ***", message.sender()),
                MessageKind::Leave => println!("*** {} left the chat ***", message.sender()),
            }
        })
        .context("failed to start receive loop")?;

    transport
        .send(&ChatMessage::join(&username))
        .context("failed to announce join")?;
    println!("Connected. Type a message and press Enter; {} to quit.", cli::EXIT_COMMAND);

    // The input loop blocks on stdin, so it gets a plain OS thread. It is
    // deliberately not joined: after Ctrl-C the thread may still sit in
    // read_line, and process exit reaps it.
    let (done_tx, done_rx) = tokio::sync::oneshot::channel::<()>();
    {
        let transport = Arc::clone(&transport);
        let username = username.clone();
        std::thread::Builder::new()
            .name("lanchat-cli".to_string())
            .spawn(move || {
                cli::run_input_loop(&username, &transport);
                let _ = done_tx.send(());
            })
            .context("failed to spawn input thread")?;
    }

    tokio::select! {
        _ = done_rx => info!("input loop finished"),
        _ = tokio::signal::ctrl_c() => info!("shutdown signal received"),
    }

    // Best-effort goodbye; the group should learn we left.
    if let Err(e) = transport.send(&ChatMessage::leave(&username)) {
        warn!("failed to announce leave: {e}");
    }
    transport.shutdown();

    info!("LAN chat stopped");
    Ok(())
}

/// Parses the single required `<username>` argument.
fn parse_username() -> anyhow::Result<String> {
    let mut args = std::env::args().skip(1);
    match (args.next(), args.next()) {
        (Some(name), None) if !name.trim().is_empty() => Ok(name),
        _ => anyhow::bail!("usage: lanchat <username>"),
    }
}

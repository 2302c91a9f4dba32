//! quotad — rate-limiting daemon speaking the memcached text protocol.
//!
//! One policy per process (`5/1m` = five hits per minute per key); clients
//! ask `incr`/`get`/`delete` over TCP and a periodic task prunes idle keys.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use quotad_core::{Policy, RateLimit, Result};
use quotad_server::{cleanup, cli::Cli, dispatch::Dispatcher, server};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        tracing::error!(%err, "quotad failed to start");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let policy = Policy::new(cli.definition.count, cli.definition.period);
    let list = Arc::new(Mutex::new(RateLimit::new(policy)?));

    let listeners = server::bind_all(&cli.sources(), cli.port).await?;
    let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&list), cli.dynamic));

    let _cleanup = cleanup::install_cleanup(&list, Duration::from_secs(cli.cleanup_interval))?;

    let mut accept_tasks = Vec::new();
    for listener in listeners {
        accept_tasks.push(tokio::spawn(server::accept_loop(
            listener,
            Arc::clone(&dispatcher),
        )));
    }

    shutdown_signal().await;
    tracing::info!("shutting down");

    // In-flight connections are not drained; they drop with the runtime.
    for task in accept_tasks {
        task.abort();
    }
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "no SIGTERM handler; SIGINT only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

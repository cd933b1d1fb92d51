use std::time::Duration;

use anyhow::Result;
use swaybar_status::*;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the bar protocol; logs go to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let app_config = config::AppConfig::load()?;
    let setup::Setup { units, listeners } = setup::Setup::from_config(&app_config);
    tracing::info!(
        version = VERSION,
        units = units.len(),
        listeners = listeners.len(),
        interval_ms = app_config.scheduler.interval_ms,
        "starting status bar"
    );

    let (tx, rx) = mpsc::channel::<scheduler::Message>(app_config.listeners.channel_capacity);
    let backoff = Duration::from_millis(app_config.listeners.backoff_ms);
    let handles: Vec<_> = listeners
        .into_iter()
        .map(|(id, name, source)| {
            source.spawn(listener::Reporter::new(id, name, tx.clone()), backoff)
        })
        .collect();
    // Only listeners hold senders from here on.
    drop(tx);

    let scheduler = scheduler::Scheduler::new(
        units,
        rx,
        render::BarWriter::new(std::io::stdout()),
        Duration::from_millis(app_config.scheduler.interval_ms),
    );

    let result = tokio::select! {
        result = scheduler.run() => result,
        _ = shutdown_signal() => {
            tracing::info!("Received shutdown signal");
            Ok(())
        }
    };
    for handle in handles {
        handle.abort();
    }

    match result {
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
            tracing::info!("bar closed stdout; exiting");
            Ok(())
        }
        other => other.map_err(|e| anyhow::anyhow!("write status: {}", e)),
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

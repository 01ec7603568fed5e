#![doc = include_str!("../README.md")]

mod config;
mod telemetry;

use clap::Parser;
use config::{CliArgs, LoadConfig};
use flakepool::{AtomicFlakeGenerator, PoolManager, Shutdown, WallClock};
use futures::future::join_all;
use std::{
    collections::HashSet,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};
use telemetry::init_telemetry;
use tokio::{signal, task::JoinHandle};
use tokio_util::sync::CancellationToken;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// What one consumer did before it was cancelled.
#[derive(Debug, Default)]
struct ConsumerReport {
    served: u64,
    ids: Vec<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = LoadConfig::try_from(args)?;

    init_telemetry()?;
    log_startup_info(&config);

    let stop = Arc::new(AtomicBool::new(false));
    let pool = Arc::new(PoolManager::with_config(
        config.pool.clone(),
        AtomicFlakeGenerator::new(WallClock),
        Arc::clone(&stop),
    )?);

    let token = CancellationToken::new();
    let started = Instant::now();
    let consumers: Vec<JoinHandle<anyhow::Result<ConsumerReport>>> = (0..config.num_consumers)
        .map(|consumer_id| {
            let pool = Arc::clone(&pool);
            let token = token.clone();
            let verify = config.verify;
            tokio::task::spawn_blocking(move || consume(consumer_id, &pool, &token, verify))
        })
        .collect();

    tokio::select! {
        () = tokio::time::sleep(config.duration) => {
            tracing::info!("Run duration of {:?} elapsed", config.duration);
        },
        () = shutdown_signal() => {},
    }

    token.cancel();
    let results = join_all(consumers).await;
    let elapsed = started.elapsed();

    match pool.shut_down() {
        Shutdown::Completed => tracing::info!("Pool shut down"),
        Shutdown::AlreadyStopped => tracing::warn!("Pool was already stopped"),
    }
    debug_assert!(stop.load(Ordering::Acquire));

    let mut served = 0_u64;
    let mut ids = Vec::new();
    for (consumer_id, result) in results.into_iter().enumerate() {
        let report = result??;
        tracing::debug!("Consumer {consumer_id} served {} ids", report.served);
        served += report.served;
        ids.extend(report.ids);
    }

    let throughput = served as f64 / elapsed.as_secs_f64();
    tracing::info!(
        "Served {served} ids in {:.2?} ({throughput:.0} ids/s) with {} consumers",
        elapsed,
        config.num_consumers
    );
    tracing::info!("Pool stats: {:?}", pool.stats());
    if let Some(failure) = pool.last_worker_failure() {
        tracing::warn!("Last worker failure: {failure}");
    }
    tracing::info!("Buffered after shutdown: ~{}", pool.approx_len());

    if config.verify {
        let total = ids.len();
        let unique = ids.into_iter().collect::<HashSet<_>>().len();
        if unique != total {
            anyhow::bail!("{} duplicate ids among {total} served", total - unique);
        }
        tracing::info!("Verified {total} ids, all unique");
    }

    Ok(())
}

/// Acquires identifiers until `token` is cancelled.
fn consume(
    consumer_id: usize,
    pool: &PoolManager,
    token: &CancellationToken,
    verify: bool,
) -> anyhow::Result<ConsumerReport> {
    let mut report = ConsumerReport::default();

    while !token.is_cancelled() {
        let id = pool.acquire()?;
        report.served += 1;
        if verify {
            report.ids.push(id);
        }
    }

    tracing::trace!("Consumer {consumer_id} cancelled");
    Ok(report)
}

fn log_startup_info(config: &LoadConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting load generator with full config: {:#?}", config);
    } else {
        tracing::info!(
            "Starting load generator: capacity {}, {} workers, {} consumers for {:?}",
            config.pool.capacity(),
            config.pool.num_workers(),
            config.num_consumers,
            config.duration
        );
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }
}

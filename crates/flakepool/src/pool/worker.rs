use std::sync::Arc;

use tokio::task::yield_now;

use super::{shared::PoolShared, signal::Wake};
use crate::{Error, Result, generator::IdGenerator};

/// Identifiers generated between cooperative yields during a bulk fill.
const YIELD_EVERY: u64 = 1024;

/// Worker task that keeps the shared buffer between its watermarks.
///
/// - Below the low watermark it bulk-fills the buffer up to capacity.
/// - Otherwise it waits for a wake token for at most the configured timeout.
///   A token triggers a bulk fill. A timeout below the high watermark adds a
///   single identifier; at or above it nothing happens.
///
/// The stop flag is checked after every wait and every generation step. On a
/// generator error the worker records the failure in the pool's stats, spawns
/// its own replacement and returns [`Error::WorkerFailure`] as its task
/// output. The handle holding that output is dropped with the registry entry,
/// so callers observe the failure through [`PoolManager::last_worker_failure`]
/// and the `worker_failures` counter.
///
/// [`PoolManager::last_worker_failure`]: crate::PoolManager::last_worker_failure
pub(crate) async fn worker_loop<G>(worker_id: usize, shared: Arc<PoolShared<G>>) -> Result<()>
where
    G: IdGenerator + 'static,
{
    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {worker_id} started");

    match fill_loop(&shared).await {
        Ok(()) => {
            #[cfg(feature = "tracing")]
            tracing::trace!("Worker {worker_id} stopped");
            Ok(())
        }
        Err(e) => {
            #[cfg(feature = "tracing")]
            tracing::warn!("Worker {worker_id} failed: {e}");

            shared.record_failure(worker_id, &e);
            shared.replace_worker(worker_id);
            Err(Error::WorkerFailure {
                worker_id,
                source: Box::new(e),
            })
        }
    }
}

async fn fill_loop<G>(shared: &PoolShared<G>) -> Result<()>
where
    G: IdGenerator + 'static,
{
    let config = &shared.config;

    loop {
        if shared.is_stopped() {
            return Ok(());
        }

        if shared.approx_len() < config.low_watermark() {
            bulk_fill(shared).await?;
            continue;
        }

        let wake = shared.wake.wait(config.wait_timeout()).await;
        if shared.is_stopped() {
            return Ok(());
        }

        match wake {
            Wake::Token => {
                shared.stats.record_wake_token();
                bulk_fill(shared).await?;
            }
            Wake::TimedOut if shared.approx_len() < config.high_watermark() => {
                top_up(shared)?;
            }
            Wake::TimedOut => shared.stats.record_idle_tick(),
            Wake::Closed => return Ok(()),
        }
    }
}

/// Generates until the buffer reaches capacity or stop is observed.
async fn bulk_fill<G>(shared: &PoolShared<G>) -> Result<()>
where
    G: IdGenerator + 'static,
{
    shared.stats.record_bulk_fill();

    let capacity = shared.config.capacity();
    let mut len = shared.approx_len();
    let mut produced = 0_u64;

    let result = loop {
        if len >= capacity || shared.is_stopped() {
            break Ok(());
        }
        match shared.generator.next_id() {
            Ok(id) => len = shared.push(id),
            Err(e) => break Err(e),
        }
        produced += 1;

        // Give the scheduler a chance to deliver cancellation.
        if produced % YIELD_EVERY == 0 {
            yield_now().await;
            len = shared.approx_len();
        }
    };

    shared.stats.record_generated(produced);

    #[cfg(feature = "tracing")]
    tracing::debug!("Bulk fill produced {produced} ids (buffer ~{len})");

    result
}

/// Adds exactly one identifier.
fn top_up<G>(shared: &PoolShared<G>) -> Result<()>
where
    G: IdGenerator + 'static,
{
    let id = shared.generator.next_id()?;
    shared.push(id);
    shared.stats.record_top_up();
    shared.stats.record_generated(1);
    Ok(())
}

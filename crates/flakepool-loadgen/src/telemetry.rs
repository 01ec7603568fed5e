//! Console logging for the load generator.
//!
//! Events from the pool (enabled through its `tracing` feature) and from the
//! binary itself go through a single `fmt` layer. Verbosity follows
//! `RUST_LOG` and defaults to `info`; `RUST_LOG=flakepool=debug` shows bulk
//! fills and shutdown phases, `trace` adds worker lifecycle events.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(true)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339()),
        )
        .try_init()?;

    Ok(())
}

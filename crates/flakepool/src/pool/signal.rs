use core::time::Duration;
use tokio::{sync::Semaphore, time::timeout};

/// Outcome of waiting on a [`WakeSignal`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Wake {
    /// A refill was requested.
    Token,
    /// Nothing arrived before the timeout.
    TimedOut,
    /// The signal was closed by shutdown.
    Closed,
}

/// Bounded bag of wake tokens shared by all workers.
///
/// Offering a token never blocks: once `capacity` tokens are pending extra
/// offers are dropped. Closing wakes every parked waiter at once.
pub(crate) struct WakeSignal {
    tokens: Semaphore,
    capacity: usize,
}

impl WakeSignal {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            tokens: Semaphore::new(0),
            capacity,
        }
    }

    /// Best-effort, non-blocking send. Returns `false` when the bag is full
    /// or closed.
    pub(crate) fn offer(&self) -> bool {
        // Racy against concurrent offers; overshoot is bounded by the number
        // of concurrent callers.
        if self.tokens.is_closed() || self.tokens.available_permits() >= self.capacity {
            return false;
        }
        self.tokens.add_permits(1);
        true
    }

    /// Waits up to `wait` for a token and consumes it.
    pub(crate) async fn wait(&self, wait: Duration) -> Wake {
        match timeout(wait, self.tokens.acquire()).await {
            Ok(Ok(permit)) => {
                permit.forget();
                Wake::Token
            }
            Ok(Err(_closed)) => Wake::Closed,
            Err(_elapsed) => Wake::TimedOut,
        }
    }

    pub(crate) fn close(&self) {
        self.tokens.close();
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> usize {
        self.tokens.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::runtime::Builder;

    fn block_on<F: core::future::Future>(f: F) -> F::Output {
        Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap()
            .block_on(f)
    }

    #[test]
    fn offers_are_bounded() {
        let signal = WakeSignal::new(2);
        assert!(signal.offer());
        assert!(signal.offer());
        assert!(!signal.offer());
        assert_eq!(signal.pending(), 2);
    }

    #[test]
    fn wait_consumes_a_token() {
        let signal = WakeSignal::new(4);
        signal.offer();
        block_on(async {
            assert_eq!(signal.wait(Duration::from_millis(10)).await, Wake::Token);
            assert_eq!(signal.wait(Duration::from_millis(10)).await, Wake::TimedOut);
        });
        assert_eq!(signal.pending(), 0);
    }

    #[test]
    fn close_wakes_waiters_and_rejects_offers() {
        let signal = WakeSignal::new(4);
        signal.close();
        assert!(!signal.offer());
        block_on(async {
            assert_eq!(signal.wait(Duration::from_secs(5)).await, Wake::Closed);
        });
    }
}

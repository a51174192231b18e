//! # Start gate
//!
//! [`StartGate`] is a one-shot latch shared by several gated generators so they
//! start pushing at the same moment. It is backed by a
//! [`CancellationToken`]: releasing the gate "cancels" the token, which wakes
//! every waiter and stays released forever.

use tokio_util::sync::CancellationToken;

/// One-shot signal that releases every generator waiting on it.
///
/// Cheap to clone; clones share the same latch.
#[derive(Clone, Debug, Default)]
pub struct StartGate {
    token: CancellationToken,
}

impl StartGate {
    /// Creates a closed gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the gate. Idempotent.
    pub fn release(&self) {
        self.token.cancel();
    }

    /// Returns true once the gate was released.
    pub fn is_released(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Waits until the gate is released (returns immediately if it already is).
    pub async fn wait(&self) {
        self.token.cancelled().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_waiters_wake_on_release() {
        let gate = StartGate::new();
        assert!(!gate.is_released());

        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let g = gate.clone();
                tokio::spawn(async move { g.wait().await })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(10)).await;
        gate.release();
        for w in waiters {
            w.await.unwrap();
        }
        assert!(gate.is_released());

        // Already released: returns at once.
        gate.wait().await;
    }
}

//! One-way interaction latch.
//!
//! Some platforms drop or corrupt file writes issued before the first
//! user-driven focus or input event. The [`InteractionGate`] records whether
//! that event has happened. Once opened it stays open for the life of the
//! process; clones share the same latch.

use std::sync::Arc;

use tokio::sync::watch;

#[derive(Clone)]
pub struct InteractionGate {
    sender: Arc<watch::Sender<bool>>,
}

impl InteractionGate {
    /// A gate that blocks until [`open`](Self::open) is called.
    pub fn closed() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// A gate that never blocks, for platforms without the requirement.
    pub fn opened() -> Self {
        let (sender, _) = watch::channel(true);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Gate matching a platform flag: closed when the gate is required.
    pub fn for_platform(requires_interaction: bool) -> Self {
        if requires_interaction {
            Self::closed()
        } else {
            Self::opened()
        }
    }

    /// Record a qualifying user interaction. Idempotent.
    pub fn open(&self) {
        self.sender.send_if_modified(|open| {
            if *open {
                false
            } else {
                log::debug!("interaction gate opened");
                *open = true;
                true
            }
        });
    }

    pub fn is_open(&self) -> bool {
        *self.sender.borrow()
    }

    /// Wait until the gate is open. Returns immediately if it already is.
    ///
    /// There is no timeout: if no interaction is ever observed this never
    /// completes.
    pub async fn wait(&self) {
        let mut rx = self.sender.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|open| *open).await;
    }
}

impl Default for InteractionGate {
    fn default() -> Self {
        Self::opened()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn opened_gate_does_not_block() {
        let gate = InteractionGate::opened();
        assert!(gate.is_open());
        gate.wait().await;
    }

    #[tokio::test]
    async fn closed_gate_blocks_until_opened() {
        let gate = InteractionGate::closed();
        assert!(!gate.is_open());

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.wait().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        gate.open();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter released")
            .unwrap();
    }

    #[tokio::test]
    async fn clones_share_the_latch() {
        let gate = InteractionGate::closed();
        let other = gate.clone();

        other.open();
        other.open();

        assert!(gate.is_open());
        gate.wait().await;
    }

    #[test]
    fn for_platform_matches_flag() {
        assert!(!InteractionGate::for_platform(true).is_open());
        assert!(InteractionGate::for_platform(false).is_open());
    }
}

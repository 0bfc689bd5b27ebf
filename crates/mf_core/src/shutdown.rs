//! Shutdown coordination shared by the engine, the health server and main.

use tokio::sync::watch;

/// Owns the shutdown flag. Dropping the coordinator also counts as shutdown.
pub struct ShutdownCoordinator {
    tx: watch::Sender<bool>,
}

/// Cloneable receiving side handed to each task.
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal { rx: self.tx.subscribe() }
    }

    pub fn trigger_shutdown(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_shutdown_requested(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves once shutdown has been triggered or the coordinator is gone.
    pub async fn cancelled(&mut self) {
        // wait_for errors only when the sender was dropped
        let _ = self.rx.wait_for(|requested| *requested).await;
    }
}

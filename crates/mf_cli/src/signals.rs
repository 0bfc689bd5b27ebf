use mf_core::ShutdownCoordinator;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Trigger shutdown on the first SIGINT/SIGTERM; exit immediately on the second.
pub fn install_signal_handlers(coordinator: Arc<ShutdownCoordinator>) {
    let received = Arc::new(AtomicUsize::new(0));

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let coordinator = coordinator.clone();
        let received = received.clone();
        tokio::spawn(async move {
            let Ok(mut terminate) = signal(SignalKind::terminate()) else {
                warn!("Unable to listen for SIGTERM");
                return;
            };
            while terminate.recv().await.is_some() {
                on_signal("SIGTERM", &coordinator, &received);
            }
        });
    }

    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            on_signal("SIGINT", &coordinator, &received);
        }
    });
}

fn on_signal(name: &str, coordinator: &ShutdownCoordinator, received: &AtomicUsize) {
    if received.fetch_add(1, Ordering::AcqRel) >= 1 {
        warn!("Received second shutdown signal ({}); exiting", name);
        std::process::exit(130);
    }
    info!("Received shutdown signal ({})", name);
    coordinator.trigger_shutdown();
}

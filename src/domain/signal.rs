//! # Abort Signal
//!
//! The cancellable context shared by one interaction (stream consumption and
//! action execution). Built on a `watch` channel carrying a single "aborted" flag.

use std::sync::Arc;
use tokio::sync::watch;

/// Creates a connected handle/signal pair.
pub fn abort_channel() -> (AbortHandle, AbortSignal) {
    let (tx, rx) = watch::channel(false);
    (
        AbortHandle { tx: Arc::new(tx) },
        AbortSignal { rx: Some(rx) },
    )
}

/// Sender side. Cheap to clone; every clone aborts the same interaction.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl AbortHandle {
    pub fn abort(&self) {
        // send_replace never fails, even with no receivers left.
        self.tx.send_replace(true);
    }
}

/// Receiver side, polled by the reassembler and the executor.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    rx: Option<watch::Receiver<bool>>,
}

impl AbortSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_aborted(&self) -> bool {
        self.rx.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Resolves once the interaction is aborted. Pends forever if it never is,
    /// including when every handle has been dropped without aborting.
    pub async fn aborted(&mut self) {
        if let Some(rx) = self.rx.as_mut() {
            loop {
                if *rx.borrow_and_update() {
                    return;
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
        }
        std::future::pending::<()>().await
    }
}

impl Default for AbortSignal {
    fn default() -> Self {
        Self::never()
    }
}

//! ## provbana-core::signal
//! **User abort signalling for a running scenario**
//!
//! `abort_channel` returns a handle that requests the abort and a signal the
//! event loop can await. Once raised, the abort stays raised.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct AbortHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl AbortHandle {
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }
}

#[derive(Debug, Clone)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

pub fn abort_channel() -> (AbortHandle, AbortSignal) {
    let (tx, rx) = watch::channel(false);
    (AbortHandle { tx: Arc::new(tx) }, AbortSignal { rx })
}

impl AbortSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_, signal) = abort_channel();
        signal
    }

    /// A signal raised by Ctrl-C. Must be called inside a Tokio runtime.
    pub fn on_ctrl_c() -> Self {
        let (handle, signal) = abort_channel();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Interrupt received, aborting scenario");
                    handle.abort();
                }
                Err(e) => warn!("Unable to listen for Ctrl-C: {}", e),
            }
        });
        signal
    }

    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once an abort is requested. Pends forever if every handle is
    /// dropped without aborting.
    pub async fn aborted(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|raised| *raised).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

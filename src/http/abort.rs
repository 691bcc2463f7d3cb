//! Per-request abort signal.
//!
//! The engine owns an [`AbortHandle`] for as long as it drives a request.
//! If the request future is dropped before completion (the client closed the
//! connection), the handle fires and every [`AbortSignal`] clone observes it.
//! A handle that reached completion is disarmed and never fires.

use tokio::sync::watch;

/// Read side of the abort signal, carried in the request context.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    /// True once the request has been aborted.
    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve when the request is aborted. Pending forever if it completes
    /// normally.
    pub async fn aborted(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|aborted| *aborted).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Write side of the abort signal, held by the engine.
#[derive(Debug)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
    armed: bool,
}

impl AbortHandle {
    /// Create a connected handle/signal pair.
    pub fn new() -> (Self, AbortSignal) {
        let (tx, rx) = watch::channel(false);
        (Self { tx, armed: true }, AbortSignal { rx })
    }

    /// Fire the signal now.
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }

    /// Mark the request as completed; dropping the handle will not fire.
    pub fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for AbortHandle {
    fn drop(&mut self) {
        if self.armed && !*self.tx.borrow() {
            self.tx.send_replace(true);
            tracing::debug!("Request aborted before completion");
        }
    }
}

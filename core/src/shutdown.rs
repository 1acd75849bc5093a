//! A minimal cooperative shutdown signal, in the shape of the teacher's `tari_shutdown` crate
//! (a `watch`-backed trigger/signal pair) — vendored as a newtype here rather than pulled in as
//! a dependency, since this crate has no other use for the rest of the Tari base-layer stack
//! that crate ships alongside (see DESIGN.md).

use tokio::sync::watch;

#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn new() -> (Self, ShutdownSignal) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, ShutdownSignal { rx })
    }

    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }
}

#[derive(Clone, Debug)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolves once [`ShutdownTrigger::trigger`] has been called.
    pub async fn wait(&mut self) {
        if *self.rx.borrow() {
            return;
        }
        let _ = self.rx.changed().await;
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }
}

//! Idle auto-disconnect timer
//!
//! A one-shot, resettable timer. When the idle window elapses it posts
//! a disconnect request through a channel; the owning session drains
//! the channel at the entry of each operation and closes its own
//! transport. The timer never touches session state directly.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

pub(crate) struct IdleTimer {
    reset_tx: mpsc::UnboundedSender<()>,
    task: JoinHandle<()>,
}

/// Spawn the timer; the receiver yields one message when the idle
/// window elapses without a reset
pub(crate) fn spawn(idle: Duration) -> (IdleTimer, mpsc::UnboundedReceiver<()>) {
    let (reset_tx, mut reset_rx) = mpsc::unbounded_channel();
    let (fire_tx, fire_rx) = mpsc::unbounded_channel();

    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(idle) => {
                    debug!("Idle for {idle:?}, requesting disconnect");
                    let _ = fire_tx.send(());
                    break;
                }
                msg = reset_rx.recv() => {
                    if msg.is_none() {
                        break;
                    }
                }
            }
        }
    });

    (IdleTimer { reset_tx, task }, fire_rx)
}

impl IdleTimer {
    /// Restart the idle window
    pub(crate) fn touch(&self) {
        let _ = self.reset_tx.send(());
    }
}

impl Drop for IdleTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

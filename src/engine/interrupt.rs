// src/engine/interrupt.rs

use std::future;

use tokio::sync::oneshot;

/// Cooperative "please stop" signal from the caller.
///
/// Backed by a one-shot channel. A sender dropped without firing means no
/// interrupt will ever arrive.
#[derive(Debug)]
pub struct InterruptSignal {
    rx: Option<oneshot::Receiver<()>>,
    fired: bool,
}

impl InterruptSignal {
    /// A connected sender/signal pair.
    pub fn channel() -> (oneshot::Sender<()>, Self) {
        let (tx, rx) = oneshot::channel();
        (
            tx,
            Self {
                rx: Some(rx),
                fired: false,
            },
        )
    }

    /// A signal that never fires.
    pub fn never() -> Self {
        Self {
            rx: None,
            fired: false,
        }
    }

    /// Non-blocking check.
    pub fn poll_fired(&mut self) -> bool {
        if self.fired {
            return true;
        }
        if let Some(rx) = self.rx.as_mut() {
            match rx.try_recv() {
                Ok(()) => {
                    self.fired = true;
                    self.rx = None;
                }
                Err(oneshot::error::TryRecvError::Closed) => self.rx = None,
                Err(oneshot::error::TryRecvError::Empty) => {}
            }
        }
        self.fired
    }

    /// Resolve when the interrupt fires; pending forever otherwise.
    ///
    /// Cancel-safe, so it can sit in a `select!` branch.
    pub async fn fired(&mut self) {
        if self.fired {
            return;
        }
        let Some(rx) = self.rx.as_mut() else {
            return future::pending().await;
        };
        let res = rx.await;
        self.rx = None;
        match res {
            Ok(()) => self.fired = true,
            Err(_) => future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn fires_after_send() {
        let (tx, mut sig) = InterruptSignal::channel();
        assert!(!sig.poll_fired());
        tx.send(()).unwrap();
        assert!(sig.poll_fired());
        assert!(sig.poll_fired());
        sig.fired().await;
    }

    #[tokio::test]
    async fn dropped_sender_never_fires() {
        let (tx, mut sig) = InterruptSignal::channel();
        drop(tx);
        assert!(!sig.poll_fired());
        let waited = tokio::time::timeout(Duration::from_millis(20), sig.fired()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn never_stays_quiet() {
        let mut sig = InterruptSignal::never();
        assert!(!sig.poll_fired());
        let waited = tokio::time::timeout(Duration::from_millis(20), sig.fired()).await;
        assert!(waited.is_err());
    }
}

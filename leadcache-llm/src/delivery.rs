//! One-shot result delivery.
//!
//! A request handler waits on the receiving half while a worker task runs
//! the generation call. Delivering consumes the [`Delivery`], so at most one
//! result is ever written. If the handler goes away first (client
//! disconnect, server shutdown), the worker observes the closed channel and
//! abandons its work without delivering.

use std::future::Future;

use tokio::sync::oneshot;

/// Sending half of a one-shot result channel.
#[derive(Debug)]
pub struct Delivery<T> {
    tx: oneshot::Sender<T>,
}

/// What happened to a delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// The receiver was dropped; the value was discarded.
    CallerGone,
}

/// Create a connected delivery pair.
pub fn delivery_channel<T>() -> (Delivery<T>, oneshot::Receiver<T>) {
    let (tx, rx) = oneshot::channel();
    (Delivery { tx }, rx)
}

impl<T> Delivery<T> {
    /// Hand `value` to the waiting caller.
    pub fn deliver(self, value: T) -> DeliveryOutcome {
        match self.tx.send(value) {
            Ok(()) => DeliveryOutcome::Delivered,
            Err(_) => DeliveryOutcome::CallerGone,
        }
    }

    /// Whether the caller has stopped waiting.
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }

    /// Resolves once the caller stops waiting.
    pub async fn abandoned(&mut self) {
        self.tx.closed().await
    }
}

/// Run `work` and deliver its output, racing it against the caller leaving.
///
/// When the caller leaves first, `work` is dropped mid-flight and
/// [`DeliveryOutcome::CallerGone`] is returned without delivering anything.
pub async fn deliver_unless_abandoned<T, F>(mut delivery: Delivery<T>, work: F) -> DeliveryOutcome
where
    F: Future<Output = T>,
{
    tokio::select! {
        value = work => delivery.deliver(value),
        _ = delivery.abandoned() => DeliveryOutcome::CallerGone,
    }
}

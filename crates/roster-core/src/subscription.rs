//! Live query subscriptions.
//!
//! A [`Subscription`] is the consumer's handle on a producer task that pushes
//! a fresh snapshot every time the watched collection changes. The consumer
//! ends it with [`Subscription::unsubscribe`]; dropping the handle stops the
//! producer as well.

use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle};

use crate::{Error, Result};

/// Producer side of a [`Subscription`].
pub type SnapshotSender<T> = mpsc::UnboundedSender<Result<T>>;

#[derive(Debug)]
pub struct Subscription<T> {
  rx:       mpsc::UnboundedReceiver<Result<T>>,
  producer: JoinHandle<()>,
}

impl<T: Send + 'static> Subscription<T> {
  /// Spawn `produce` with the sending half of a fresh channel and return the
  /// receiving handle.
  pub fn spawn<F, Fut>(produce: F) -> Self
  where
    F: FnOnce(SnapshotSender<T>) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
  {
    let (tx, rx) = mpsc::unbounded_channel();
    let producer = tokio::spawn(produce(tx));
    Self { rx, producer }
  }
}

impl<T> Subscription<T> {
  /// Wait for the next snapshot. `None` once the producer has stopped.
  pub async fn next(&mut self) -> Option<Result<T>> { self.rx.recv().await }

  /// Like [`next`](Self::next) but fails with [`Error::Timeout`] when nothing
  /// arrives within `timeout`.
  pub async fn next_within(&mut self, timeout: Duration) -> Result<Option<T>> {
    match tokio::time::timeout(timeout, self.rx.recv()).await {
      Err(_) => Err(Error::Timeout(timeout)),
      Ok(None) => Ok(None),
      Ok(Some(snapshot)) => snapshot.map(Some),
    }
  }

  /// Stop the producer and discard anything still buffered.
  pub fn unsubscribe(mut self) {
    self.producer.abort();
    self.rx.close();
  }

  pub fn is_active(&self) -> bool { !self.producer.is_finished() }
}

impl<T> Drop for Subscription<T> {
  fn drop(&mut self) { self.producer.abort(); }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn delivers_then_ends() {
    let mut sub = Subscription::spawn(|tx: SnapshotSender<u32>| async move {
      let _ = tx.send(Ok(1));
      let _ = tx.send(Ok(2));
    });
    assert_eq!(sub.next().await.unwrap().unwrap(), 1);
    assert_eq!(sub.next().await.unwrap().unwrap(), 2);
    assert!(sub.next().await.is_none());
  }

  #[tokio::test]
  async fn silent_producer_times_out() {
    let mut sub = Subscription::spawn(|tx: SnapshotSender<u32>| async move {
      tokio::time::sleep(Duration::from_secs(60)).await;
      drop(tx);
    });
    let err = sub.next_within(Duration::from_millis(20)).await.unwrap_err();
    assert!(matches!(err, Error::Timeout(_)));
    sub.unsubscribe();
  }

  #[tokio::test]
  async fn unsubscribe_stops_producer() {
    let (probe_tx, mut probe_rx) = mpsc::unbounded_channel::<()>();
    let sub = Subscription::spawn(move |tx: SnapshotSender<u32>| async move {
      let _keep = probe_tx;
      loop {
        if tx.send(Ok(0)).is_err() {
          break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
      }
    });
    sub.unsubscribe();
    // The probe sender lives inside the producer, so the channel closes only
    // once the task is gone.
    assert!(probe_rx.recv().await.is_none());
  }
}

//! Minimal observer plumbing shared by the store, queue and controller.
//!
//! Subscribers receive events over plain `mpsc` channels, the same way the
//! runtime talks to the audio thread. A subscriber that drops its receiver
//! is pruned on the next emit.

use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Debug)]
pub struct Notifier<T> {
    subscribers: Vec<Sender<T>>,
}

impl<T> Default for Notifier<T> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }
}

impl<T: Clone> Notifier<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber and return its receiving end.
    pub fn subscribe(&mut self) -> Receiver<T> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber.
    pub fn emit(&mut self, event: T) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_reaches_every_subscriber() {
        let mut n: Notifier<u32> = Notifier::new();
        let a = n.subscribe();
        let b = n.subscribe();
        n.emit(7);
        assert_eq!(a.try_recv().unwrap(), 7);
        assert_eq!(b.try_recv().unwrap(), 7);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut n: Notifier<u32> = Notifier::new();
        let keep = n.subscribe();
        drop(n.subscribe());
        assert_eq!(n.subscriber_count(), 2);
        n.emit(1);
        assert_eq!(n.subscriber_count(), 1);
        assert_eq!(keep.try_recv().unwrap(), 1);
    }
}

//! Inbound transport events, funnelled to the single loop consumer.
//!
//! Transport callbacks may run on another thread or in an interrupt-like
//! context; they only ever enqueue. The control loop drains the queue once
//! per iteration, so the position model keeps a single writer.
use crossbeam_channel as xch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connected,
    Disconnected,
    Write { handle: u8, payload: Vec<u8> },
}

impl TransportEvent {
    pub fn write(handle: u8, payload: impl Into<Vec<u8>>) -> Self {
        TransportEvent::Write {
            handle,
            payload: payload.into(),
        }
    }
}

/// Producer handle; cheap to clone and `Send`.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: xch::Sender<TransportEvent>,
}

impl EventSender {
    /// Enqueue without blocking. Returns `false` when the queue is full or the
    /// loop is gone; the event is dropped in that case.
    pub fn push(&self, ev: TransportEvent) -> bool {
        match self.tx.try_send(ev) {
            Ok(()) => true,
            Err(xch::TrySendError::Full(ev)) => {
                tracing::warn!(event = ?ev, "event queue full; dropping");
                false
            }
            Err(xch::TrySendError::Disconnected(_)) => {
                tracing::debug!("event queue consumer gone");
                false
            }
        }
    }
}

#[derive(Debug)]
pub struct EventReceiver {
    rx: xch::Receiver<TransportEvent>,
}

impl EventReceiver {
    /// Take everything queued right now; never blocks.
    pub fn drain(&self) -> xch::TryIter<'_, TransportEvent> {
        self.rx.try_iter()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Bounded queue; `capacity` is clamped to at least 1.
pub fn event_queue(capacity: usize) -> (EventSender, EventReceiver) {
    let (tx, rx) = xch::bounded(capacity.max(1));
    (EventSender { tx }, EventReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_returns_events_in_order() {
        let (tx, rx) = event_queue(4);
        assert!(tx.push(TransportEvent::Connected));
        assert!(tx.push(TransportEvent::write(2, [5u8, 0])));
        let got: Vec<_> = rx.drain().collect();
        assert_eq!(
            got,
            vec![TransportEvent::Connected, TransportEvent::write(2, vec![5u8, 0])]
        );
        assert!(rx.is_empty());
    }

    #[test]
    fn full_queue_drops_instead_of_blocking() {
        let (tx, rx) = event_queue(1);
        assert!(tx.push(TransportEvent::Connected));
        assert!(!tx.push(TransportEvent::Disconnected));
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn producers_can_live_on_other_threads() {
        let (tx, rx) = event_queue(8);
        let t = std::thread::spawn(move || {
            for i in 0..4u8 {
                tx.push(TransportEvent::write(5, [i, 0, 0, 0]));
            }
        });
        t.join().unwrap();
        assert_eq!(rx.drain().count(), 4);
    }
}

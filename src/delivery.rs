//! Delivery path into the terminal program.
//!
//! Many producers (event relay, control listener, shutdown) feed one consumer
//! (the terminal program's run loop). The queue is unbounded so producers
//! never block on a slow repaint.

use crate::api::{ControlRequest, Event};
use tokio::sync::mpsc;

/// One message for the terminal program.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A server event that passed the relay filter.
    Event(Event),
    /// The event stream ended with an error; shown once to the user.
    StreamFailed(String),
    /// An automation request from the control queue.
    Control(ControlRequest),
    /// Ask the run loop to exit.
    Quit,
}

/// Producer half. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DeliverySender {
    tx: mpsc::UnboundedSender<Message>,
}

impl DeliverySender {
    /// Enqueue a message. Returns `false` once the consumer is gone.
    pub fn send(&self, message: Message) -> bool {
        self.tx.send(message).is_ok()
    }
}

/// Consumer half, owned by the terminal program.
#[derive(Debug)]
pub struct DeliveryReceiver {
    rx: mpsc::UnboundedReceiver<Message>,
}

impl DeliveryReceiver {
    /// Take the next message if one is queued, without blocking.
    pub fn try_next(&mut self) -> Option<Message> {
        self.rx.try_recv().ok()
    }

    /// Drain everything currently queued.
    pub fn drain(&mut self) -> Vec<Message> {
        let mut out = Vec::new();
        while let Ok(message) = self.rx.try_recv() {
            out.push(message);
        }
        out
    }

    /// Wait for the next message; `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }

    /// Blocking variant of [`Self::recv`] for run loops outside the runtime.
    pub fn blocking_recv(&mut self) -> Option<Message> {
        self.rx.blocking_recv()
    }
}

/// Create a connected sender/receiver pair.
pub fn channel() -> (DeliverySender, DeliveryReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (DeliverySender { tx }, DeliveryReceiver { rx })
}

//! Event relay: server event stream -> terminal program.
//!
//! Opens `GET /event` once, drops internal events, and forwards the rest in
//! arrival order. Runs until the cancellation scope fires, the stream ends, or
//! the terminal program stops accepting messages.

use crate::api::{Event, EventStream, RemoteApi};
use crate::delivery::{DeliverySender, Message};
use crate::error::StreamError;
use futures_util::StreamExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Lifecycle of a relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Running,
    /// Cancellation observed; no further events are pulled.
    Draining,
    Stopped,
}

/// Why a relay stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayExit {
    Cancelled,
    /// The server closed the stream cleanly.
    StreamEnded,
    /// The stream failed to open or broke; surfaced to the user once.
    StreamFailed,
    /// The terminal program dropped its receiver.
    ConsumerGone,
}

/// Map a decoded event to what the terminal program should see, if anything.
pub fn route(event: Event) -> Option<Message> {
    if event.is_internal() {
        None
    } else {
        Some(Message::Event(event))
    }
}

pub struct EventRelay {
    api: Arc<dyn RemoteApi>,
    delivery: DeliverySender,
    scope: CancellationToken,
    state: RelayState,
    forwarded: usize,
}

impl EventRelay {
    pub fn new(api: Arc<dyn RemoteApi>, delivery: DeliverySender, scope: CancellationToken) -> Self {
        Self {
            api,
            delivery,
            scope,
            state: RelayState::Running,
            forwarded: 0,
        }
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    /// Number of events handed to the terminal program so far.
    pub fn forwarded(&self) -> usize {
        self.forwarded
    }

    /// Open the event stream and pump it until a terminal condition.
    pub async fn run(&mut self) -> RelayExit {
        let opened = tokio::select! {
            biased;
            _ = self.scope.cancelled() => return self.stop(RelayExit::Cancelled),
            opened = self.api.open_event_stream() => opened,
        };
        match opened {
            Ok(stream) => self.pump(stream).await,
            Err(err) => self.fail(StreamError::Open(err)),
        }
    }

    /// Forward events from an already-open stream.
    pub async fn pump(&mut self, mut stream: EventStream) -> RelayExit {
        tracing::debug!("event relay running");
        loop {
            let next = tokio::select! {
                biased;
                _ = self.scope.cancelled() => {
                    self.transition(RelayState::Draining);
                    drop(stream);
                    return self.stop(RelayExit::Cancelled);
                }
                next = stream.next() => next,
            };

            match next {
                Some(Ok(event)) => {
                    let kind = event.kind().to_string();
                    let Some(message) = route(event) else {
                        tracing::trace!(kind, "dropping internal event");
                        continue;
                    };
                    if !self.delivery.send(message) {
                        return self.stop(RelayExit::ConsumerGone);
                    }
                    self.forwarded += 1;
                }
                Some(Err(err)) => return self.fail(err),
                None => {
                    tracing::info!("event stream closed by server");
                    return self.stop(RelayExit::StreamEnded);
                }
            }
        }
    }

    fn fail(&mut self, err: StreamError) -> RelayExit {
        // A cancelled scope means the failure is a side effect of teardown.
        if self.scope.is_cancelled() {
            return self.stop(RelayExit::Cancelled);
        }
        tracing::error!(error = %err, "Error streaming events");
        self.delivery.send(Message::StreamFailed(err.to_string()));
        self.stop(RelayExit::StreamFailed)
    }

    fn stop(&mut self, exit: RelayExit) -> RelayExit {
        self.transition(RelayState::Stopped);
        tracing::debug!(?exit, forwarded = self.forwarded, "event relay stopped");
        exit
    }

    fn transition(&mut self, next: RelayState) {
        if self.state != next {
            tracing::trace!(from = ?self.state, to = ?next, "relay state");
            self.state = next;
        }
    }
}

//! Local control listener.
//!
//! Long-polls the server's control queue so automation (editor integrations,
//! scripts) can drive the terminal program. Each request is forwarded to the
//! program and acknowledged; poll failures are logged and retried after a
//! delay until the cancellation scope fires.

use crate::api::RemoteApi;
use crate::delivery::{DeliverySender, Message};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Why the listener stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerExit {
    Cancelled,
    ConsumerGone,
}

pub struct ControlListener {
    api: Arc<dyn RemoteApi>,
    delivery: DeliverySender,
    scope: CancellationToken,
    retry_delay: Duration,
}

impl ControlListener {
    pub fn new(
        api: Arc<dyn RemoteApi>,
        delivery: DeliverySender,
        scope: CancellationToken,
        retry_delay: Duration,
    ) -> Self {
        Self {
            api,
            delivery,
            scope,
            retry_delay,
        }
    }

    pub async fn run(self) -> ListenerExit {
        tracing::debug!("control listener started");
        loop {
            let polled = tokio::select! {
                biased;
                _ = self.scope.cancelled() => break ListenerExit::Cancelled,
                polled = self.api.next_control_request() => polled,
            };

            let request = match polled {
                Ok(request) => request,
                Err(err) => {
                    tracing::warn!(error = %err, "control poll failed");
                    tokio::select! {
                        biased;
                        _ = self.scope.cancelled() => break ListenerExit::Cancelled,
                        _ = tokio::time::sleep(self.retry_delay) => continue,
                    }
                }
            };

            tracing::debug!(path = %request.path, "control request");
            if !self.delivery.send(Message::Control(request)) {
                break ListenerExit::ConsumerGone;
            }
            // The acknowledgement of an accepted request always completes.
            if let Err(err) = self.api.reply_control(&Value::Bool(true)).await {
                tracing::warn!(error = %err, "control reply failed");
            }
        }
    }
}

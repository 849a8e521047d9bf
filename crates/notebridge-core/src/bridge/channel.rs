//! Inbound event channel
//!
//! The host's callback entry point feeds a single-consumer queue. Binding
//! creates the queue; the controller owns the receiving end and unbinds it on
//! teardown, after which the host's calls fail with [`BridgeError::Unbound`].
//!
//! Results are never handed to the controller synchronously: a host posting
//! from inside a trigger call only enqueues, and the controller sees the
//! event on a later turn when it drains the queue.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::event::{Envelope, HostEvent, InboundEvent};
use super::pending::RequestToken;
use super::BridgeError;

/// Create the queue, returning the host-facing and controller-facing ends
pub fn bind() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    debug!("Host bridge bound");
    (EventSender { tx }, EventReceiver { rx })
}

/// Host-facing end; cheap to clone into every shell
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<InboundEvent>,
}

impl EventSender {
    /// The global callback: `handleEvent(type, data, extra)`
    pub fn handle_event(
        &self,
        kind: &str,
        data: impl Into<String>,
        extra: Option<String>,
    ) -> Result<(), BridgeError> {
        match HostEvent::from_parts(kind, data.into(), extra) {
            Ok(event) => self.post(None, event),
            Err(e) => self.reject(None, e),
        }
    }

    /// Callback variant for hosts sending a JSON envelope
    pub fn handle_envelope(&self, json: &str) -> Result<(), BridgeError> {
        let envelope: Envelope = serde_json::from_str(json).map_err(|e| {
            warn!("Unparseable host envelope: {}", e);
            BridgeError::from(e)
        })?;
        let token = envelope.token;
        match envelope.into_event() {
            Ok(event) => self.post(token, event),
            Err(e) => self.reject(token, e),
        }
    }

    /// Post an event answering the request identified by `token`
    pub fn post(&self, token: Option<RequestToken>, event: HostEvent) -> Result<(), BridgeError> {
        self.send(InboundEvent::new(token, event))
    }

    pub fn is_bound(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Report a rejected event to the host
    ///
    /// A result with no payload still answers its request, so an `ERROR` is
    /// queued in its place and the request closes.
    fn reject(&self, token: Option<RequestToken>, error: BridgeError) -> Result<(), BridgeError> {
        warn!("Rejected host event: {}", error);
        if let BridgeError::MissingPayload(_) = error {
            self.post(
                token,
                HostEvent::Error {
                    message: error.to_string(),
                },
            )?;
        }
        Err(error)
    }

    fn send(&self, inbound: InboundEvent) -> Result<(), BridgeError> {
        debug!("Host event {} queued", inbound.event.kind());
        self.tx.send(inbound).map_err(|_| BridgeError::Unbound)
    }
}

/// Controller-facing end of the queue
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::UnboundedReceiver<InboundEvent>,
}

impl EventReceiver {
    /// Next queued event without waiting
    pub fn try_next(&mut self) -> Option<InboundEvent> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next event; `None` once unbound and drained
    pub async fn next(&mut self) -> Option<InboundEvent> {
        self.rx.recv().await
    }

    /// Stop accepting events; already-queued ones can still be drained
    pub fn unbind(&mut self) {
        self.rx.close();
        debug!("Host bridge unbound");
    }
}

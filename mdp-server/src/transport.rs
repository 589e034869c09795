//! The request transport (§4.2): a single-producer/multi-consumer,
//! in-process queue of opaque byte envelopes, with FIFO-per-producer
//! ordering and exactly-once delivery to a worker.
//!
//! Modeled as a `tokio::sync::mpsc` unbounded channel — "enqueue blocks
//! only on hard memory limits" (§4.2) maps directly onto an unbounded
//! channel bounded only by process memory, and keeps `enqueue_snapshot`
//! callable synchronously from the single-threaded client-session dispatch
//! path (§5) without an `.await` point. The receiving end is shared across
//! workers behind `Arc<tokio::sync::Mutex<_>>`, so at most one worker holds
//! the lock (and therefore the next envelope) at a time — the mechanism
//! that makes delivery exactly-once.

use std::sync::Arc;

use mdp_types::{Error as EnvelopeError, Request};
use tokio::sync::{mpsc, Mutex};

/// The producer side. Cheap to clone; every client session holds one.
#[derive(Clone)]
pub struct RequestTransport {
    sender: mpsc::UnboundedSender<Vec<u8>>,
}

impl RequestTransport {
    /// Encode and enqueue a `SNAPSHOT` envelope.
    pub fn enqueue_snapshot(&self, request: &Request) -> Result<(), EnvelopeError> {
        let bytes = mdp_types::envelope::encode(request);
        self.sender
            .send(bytes)
            .map_err(|_| EnvelopeError::TransportClosed)
    }

    /// Enqueue one `ABORT` envelope. The orchestrator calls this exactly
    /// `worker_count` times during shutdown (§4.7, §5 Cancellation).
    pub fn enqueue_abort(&self) -> Result<(), EnvelopeError> {
        let bytes = mdp_types::envelope::encode(&Request::abort());
        self.sender
            .send(bytes)
            .map_err(|_| EnvelopeError::TransportClosed)
    }
}

/// The shared consumer side. Every worker holds a clone; `recv` takes the
/// inner lock only around the wait itself, matching the "wait" step of the
/// worker loop in §4.3.
#[derive(Clone)]
pub struct RequestReceiver {
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<Vec<u8>>>>,
}

impl RequestReceiver {
    /// Receive and decode the next envelope. `Ok(None)` means every
    /// producer has dropped (the provider is gone) — workers treat this
    /// the same as receiving `ABORT`. `Err` is a decode failure: per §4.3
    /// the worker logs it, counts it, and keeps looping rather than
    /// exiting.
    pub async fn recv(&self) -> Option<Result<Request, EnvelopeError>> {
        let mut guard = self.receiver.lock().await;
        let bytes = guard.recv().await?;
        Some(mdp_types::envelope::decode(&bytes))
    }
}

/// Construct a fresh transport with its paired receiver.
pub fn channel() -> (RequestTransport, RequestReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        RequestTransport { sender: tx },
        RequestReceiver {
            receiver: Arc::new(Mutex::new(rx)),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdp_types::{ModelType, RequestKind, RequestToken};

    #[tokio::test]
    async fn snapshot_round_trips_through_the_channel() {
        let (tx, rx) = channel();
        let req = Request::snapshot(RequestToken(1), 1, ModelType::MarketPrice, "IBM.N", 1, 1);
        tx.enqueue_snapshot(&req).unwrap();
        let decoded = rx.recv().await.unwrap().unwrap();
        assert_eq!(decoded, req);
    }

    #[tokio::test]
    async fn abort_is_exactly_once_per_receive() {
        let (tx, rx) = channel();
        tx.enqueue_abort().unwrap();
        let decoded = rx.recv().await.unwrap().unwrap();
        assert_eq!(decoded.kind, RequestKind::Abort);
    }

    #[tokio::test]
    async fn two_workers_never_see_the_same_envelope() {
        let (tx, rx) = channel();
        for i in 0..10 {
            tx.enqueue_snapshot(&Request::snapshot(
                RequestToken(i),
                1,
                ModelType::MarketPrice,
                "IBM.N",
                1,
                1,
            ))
            .unwrap();
        }
        let rx_a = rx.clone();
        let rx_b = rx.clone();
        let a = tokio::spawn(async move {
            let mut tokens = Vec::new();
            for _ in 0..5 {
                tokens.push(rx_a.recv().await.unwrap().unwrap().request_token);
            }
            tokens
        });
        let b = tokio::spawn(async move {
            let mut tokens = Vec::new();
            for _ in 0..5 {
                tokens.push(rx_b.recv().await.unwrap().unwrap().request_token);
            }
            tokens
        });
        let mut all = a.await.unwrap();
        all.extend(b.await.unwrap());
        all.sort();
        let expected: Vec<_> = (0..10).map(RequestToken).collect();
        assert_eq!(all, expected);
    }
}
